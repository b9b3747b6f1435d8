//! Shapes of the API responses and of the files written to the cache.

use crate::shape::Shape;

/// `{ paragraphs: [{ cues: [{ time, text }] }] }`
pub fn transcript() -> Shape {
    Shape::object([(
        "paragraphs",
        Shape::array(Shape::object([(
            "cues",
            Shape::array(Shape::object([("time", Shape::Number), ("text", Shape::Str)])),
        )])),
    )])
}

pub fn lang_link() -> Shape {
    Shape::object([("lang", Shape::Locale), ("*", Shape::Str)])
}

pub fn page_record() -> Shape {
    Shape::object([
        ("pageid", Shape::Number),
        ("ns", Shape::Number),
        ("title", Shape::Str),
        ("langlinks", Shape::array(lang_link())),
    ])
}

/// `action=query&prop=langlinks`
pub fn lang_links() -> Shape {
    Shape::object([(
        "query",
        Shape::object([("pages", Shape::page_map(page_record(), 1))]),
    )])
}

/// `action=query&prop=extracts`
pub fn text_content() -> Shape {
    Shape::object([(
        "query",
        Shape::object([(
            "pages",
            Shape::page_map(
                Shape::object([
                    ("pageid", Shape::Number),
                    ("ns", Shape::Number),
                    ("title", Shape::Str),
                    ("extract", Shape::Str),
                ]),
                1,
            ),
        )]),
    )])
}

/// `action=parse&prop=text`
pub fn html_content() -> Shape {
    Shape::object([(
        "parse",
        Shape::object([
            ("pageid", Shape::Number),
            ("title", Shape::Str),
            ("text", Shape::object([("*", Shape::Str)])),
        ]),
    )])
}

/// Cached `<lang>.json`: both renderings of one article.
pub fn article_bundle() -> Shape {
    Shape::object([("text", text_content()), ("html", html_content())])
}

/// Cached `lang-links.json`.
pub fn manifest() -> Shape {
    Shape::object([("pages", Shape::page_map(page_record(), 0))])
}
