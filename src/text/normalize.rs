use crate::pipeline::transform::TransformStage;

/// Replace every line separator with a single space.
///
/// `"\r\n"` counts as one separator; a lone `"\n"` or `"\r"` is one as well.
pub fn normalize_separators(text: &str) -> String {
    if !text.contains(['\n', '\r']) {
        return text.to_owned();
    }

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push(' ');
            }
            '\n' => out.push(' '),
            other => out.push(other),
        }
    }
    out
}

fn normalize_item(item: String) -> String {
    if item.contains(['\n', '\r']) {
        normalize_separators(&item)
    } else {
        item
    }
}

pub type NormalizeStage = TransformStage<fn(String) -> String>;

/// The `normalize` stage: separators become spaces.
pub fn normalize_stage() -> NormalizeStage {
    TransformStage::new("normalize", normalize_item as fn(String) -> String)
}
