use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Keep,
    Drop,
}

impl Verdict {
    /// Decides from the leading word of the answer. Only an explicit "no"
    /// drops an item; anything unrecognised keeps it.
    pub fn from_answer(content: &str) -> Self {
        let word = content
            .trim_start()
            .split(|c: char| !c.is_alphabetic())
            .next()
            .unwrap_or("");
        if word.eq_ignore_ascii_case("no") {
            Verdict::Drop
        } else {
            Verdict::Keep
        }
    }
}
