// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_markup(paragraphs: usize) -> String {
    let base = "Some <strong>bold <em>and nested</em></strong> text, a <a href=\"https://example.com\">link</a>,<br>an image <img src=\"x.png\" alt=\"\"> and <code>code</code>. ";
    base.repeat(paragraphs)
}

#[allow(dead_code)]
pub fn generate_list_markup(items: usize, depth: usize) -> String {
    let mut markup = String::new();
    for item in 0..items {
        markup.push_str(&format!("<li>Item {item}"));
        for level in 0..depth {
            markup.push_str(&format!("<ul><li>Level {level}"));
        }
        for _ in 0..depth {
            markup.push_str("</li></ul>");
        }
        markup.push_str("</li>");
    }
    markup
}
