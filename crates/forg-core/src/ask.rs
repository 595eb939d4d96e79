//! Gopher+ ASK forms.
//!
//! An interactive item's `+ASK` info block lists one question per line
//! as `Kind:prompt[\tdefault-or-options...]`. Answers go back to the
//! server as a data block after a `loc\t+\t1` request.

use std::fmt;

use forg_types::error::{ForgError, Result};

/// Kind of an ASK question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionKind {
    /// `Ask`: one line of text.
    Ask,
    /// `AskP`: a password.
    AskP,
    /// `AskL`: several lines of text.
    AskL,
    /// `AskF`: a local file name.
    AskF,
    /// `Choose`: one of the listed options.
    Choose,
    /// `ChooseF`: a file chosen from the listed options.
    ChooseF,
    /// `Select`: one of the listed options.
    Select,
    /// `Note`: text to show; not answered.
    Note,
}

impl QuestionKind {
    /// Case-sensitive match against the protocol vocabulary.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "Ask" => QuestionKind::Ask,
            "AskP" => QuestionKind::AskP,
            "AskL" => QuestionKind::AskL,
            "AskF" => QuestionKind::AskF,
            "Choose" => QuestionKind::Choose,
            "ChooseF" => QuestionKind::ChooseF,
            "Select" => QuestionKind::Select,
            "Note" => QuestionKind::Note,
            _ => return None,
        })
    }

    pub fn keyword(self) -> &'static str {
        match self {
            QuestionKind::Ask => "Ask",
            QuestionKind::AskP => "AskP",
            QuestionKind::AskL => "AskL",
            QuestionKind::AskF => "AskF",
            QuestionKind::Choose => "Choose",
            QuestionKind::ChooseF => "ChooseF",
            QuestionKind::Select => "Select",
            QuestionKind::Note => "Note",
        }
    }

    /// Kinds whose answer is picked from `options`.
    pub fn has_options(self) -> bool {
        matches!(self, QuestionKind::Choose | QuestionKind::Select)
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One parsed ASK line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub kind: QuestionKind,
    pub prompt: String,
    pub default: String,
    /// Choices for `Choose` and `Select`; empty otherwise.
    pub options: Vec<String>,
}

impl Question {
    /// Parse a single `Kind:rest` line.
    pub fn parse(line: &str) -> Result<Self> {
        let (keyword, rest) = line
            .split_once(':')
            .ok_or_else(|| ForgError::Question(format!("no ':' in {line:?}")))?;
        let kind = QuestionKind::from_keyword(keyword.trim())
            .ok_or_else(|| ForgError::Question(format!("unknown kind {:?}", keyword.trim())))?;

        let mut question = Question {
            kind,
            prompt: String::new(),
            default: String::new(),
            options: Vec::new(),
        };

        match kind {
            QuestionKind::Ask | QuestionKind::AskP | QuestionKind::AskL => {
                let mut fields = rest.split('\t');
                question.prompt = fields.next().unwrap_or_default().trim().to_string();
                if let Some(default) = fields.next() {
                    question.default = default.to_string();
                }
                if fields.next().is_some() {
                    return Err(ForgError::Question(format!("too many tabs in {line:?}")));
                }
            },
            QuestionKind::Choose | QuestionKind::Select => {
                let (prompt, options) = rest.split_once('\t').ok_or_else(|| {
                    ForgError::Question(format!("{kind} without options in {line:?}"))
                })?;
                question.prompt = prompt.trim().to_string();
                question.options = options
                    .split('\t')
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect();
                question.default = question.options.first().cloned().ok_or_else(|| {
                    ForgError::Question(format!("{kind} without options in {line:?}"))
                })?;
            },
            QuestionKind::AskF | QuestionKind::ChooseF | QuestionKind::Note => {
                question.prompt = rest.trim().to_string();
            },
        }

        Ok(question)
    }

    /// Wire form of `answer` for this question, or `None` for a note.
    fn encode_answer(&self, answer: &str) -> Option<String> {
        match self.kind {
            QuestionKind::Note => None,
            QuestionKind::AskL => Some(format!("{}\n{answer}\n", answer.lines().count())),
            _ => Some(format!("{answer}\n")),
        }
    }
}

/// The questions of one ASK block, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AskForm {
    questions: Vec<Question>,
}

impl AskForm {
    /// Parse an ASK block. Blank lines and `.` lines are skipped; lines
    /// that do not parse are logged and dropped.
    pub fn parse(data: &str) -> Self {
        let mut questions = Vec::new();
        for line in data.lines() {
            let line = line.trim();
            if line.is_empty() || line == "." {
                continue;
            }
            match Question::parse(line) {
                Ok(q) => questions.push(q),
                Err(e) => log::warn!("Skipping ASK line {line:?}: {e}"),
            }
        }
        Self { questions }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Encode `answers`, one per question, as the data block sent after
    /// the submit request: `+<len>\r\n` followed by one answer per line.
    /// `AskL` answers are prefixed by their line count. Answers for
    /// notes are ignored.
    pub fn answers_block(&self, answers: &[String]) -> Result<Vec<u8>> {
        if answers.len() != self.questions.len() {
            return Err(ForgError::Question(format!(
                "{} answers for {} questions",
                answers.len(),
                self.questions.len()
            )));
        }

        let body: String = self
            .questions
            .iter()
            .zip(answers)
            .filter_map(|(q, a)| q.encode_answer(a))
            .collect();

        let mut block = format!("+{}\r\n", body.len()).into_bytes();
        block.extend_from_slice(body.as_bytes());
        Ok(block)
    }

    /// Defaults for every question, ready to be edited and submitted.
    pub fn default_answers(&self) -> Vec<String> {
        self.questions.iter().map(|q| q.default.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ask_with_default() {
        let q = Question::parse("Ask:What is your name?\tAnonymous").unwrap();
        assert_eq!(q.kind, QuestionKind::Ask);
        assert_eq!(q.prompt, "What is your name?");
        assert_eq!(q.default, "Anonymous");
        assert!(q.options.is_empty());
    }

    #[test]
    fn ask_without_default() {
        let q = Question::parse("AskP:Password").unwrap();
        assert_eq!(q.kind, QuestionKind::AskP);
        assert_eq!(q.prompt, "Password");
        assert_eq!(q.default, "");
    }

    #[test]
    fn choose_lists_options() {
        let q = Question::parse("Choose:Pick one\tRed\tGreen\tBlue").unwrap();
        assert_eq!(q.kind, QuestionKind::Choose);
        assert_eq!(q.prompt, "Pick one");
        assert_eq!(q.options, vec!["Red", "Green", "Blue"]);
        assert_eq!(q.default, "Red");
    }

    #[test]
    fn select_needs_options() {
        assert!(matches!(Question::parse("Select:Nothing"), Err(ForgError::Question(_))));
    }

    #[test]
    fn kinds_are_case_sensitive() {
        assert!(Question::parse("ask:lower case").is_err());
        assert!(Question::parse("Bogus:what").is_err());
        assert!(Question::parse("no colon here").is_err());
    }

    #[test]
    fn too_many_tabs_is_an_error() {
        assert!(Question::parse("Ask:prompt\tdefault\textra").is_err());
    }

    #[test]
    fn note_and_file_kinds_keep_prompt() {
        let q = Question::parse("Note: Read carefully ").unwrap();
        assert_eq!(q.kind, QuestionKind::Note);
        assert_eq!(q.prompt, "Read carefully");
        assert_eq!(Question::parse("AskF:Upload").unwrap().kind, QuestionKind::AskF);
    }

    #[test]
    fn form_skips_blank_dot_and_bad_lines() {
        let form = AskForm::parse("Note:Hello\n\nAsk:Name\nWhat:ever\n.\nChoose:Size\tS\tM\tL\n");
        let kinds: Vec<_> = form.questions().iter().map(|q| q.kind).collect();
        assert_eq!(kinds, vec![QuestionKind::Note, QuestionKind::Ask, QuestionKind::Choose]);
        assert_eq!(form.default_answers(), vec!["", "", "S"]);
    }

    #[test]
    fn answers_block_encoding() {
        let form = AskForm::parse("Note:Hi\nAsk:Name\nAskL:Comments\nSelect:Size\tS\tM\n");
        let answers = vec![
            String::new(),
            "Ann".to_string(),
            "line one\nline two".to_string(),
            "M".to_string(),
        ];
        let block = form.answers_block(&answers).unwrap();
        let body = "Ann\n2\nline one\nline two\nM\n";
        assert_eq!(block, format!("+{}\r\n{body}", body.len()).into_bytes());
    }

    #[test]
    fn answers_must_match_questions() {
        let form = AskForm::parse("Ask:One\nAsk:Two\n");
        assert!(form.answers_block(&["x".to_string()]).is_err());
    }
}
