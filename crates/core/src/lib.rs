#![forbid(unsafe_code)]

pub mod model {
    /// Status of an acceptance criterion. Transitions are monotone in the
    /// supported workflow: criteria start `Proposed` and only ever move to
    /// `Final` (via keylock).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum CriterionStatus {
        Proposed,
        Final,
    }

    impl CriterionStatus {
        pub fn as_str(self) -> &'static str {
            match self {
                CriterionStatus::Proposed => "Proposed",
                CriterionStatus::Final => "Final",
            }
        }

        pub fn parse(value: &str) -> Option<Self> {
            match value {
                "Proposed" => Some(CriterionStatus::Proposed),
                "Final" => Some(CriterionStatus::Final),
                _ => None,
            }
        }
    }

    /// Mode of a `continue` step. `Rollback` is log-only: it never reaches
    /// the checkpoint collaborator and never rewrites history.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum StepMode {
        Analyze,
        Apply,
        Test,
        Rollback,
    }

    impl StepMode {
        pub fn as_str(self) -> &'static str {
            match self {
                StepMode::Analyze => "analyze",
                StepMode::Apply => "apply",
                StepMode::Test => "test",
                StepMode::Rollback => "rollback",
            }
        }

        pub fn parse(value: &str) -> Option<Self> {
            match value {
                "analyze" => Some(StepMode::Analyze),
                "apply" => Some(StepMode::Apply),
                "test" => Some(StepMode::Test),
                "rollback" => Some(StepMode::Rollback),
                _ => None,
            }
        }
    }

    /// Action label recorded in the undo log, one per successful workflow
    /// command invocation.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum UndoAction {
        Checkpoint,
        Continue(StepMode),
        Rollback,
        Keylock,
    }

    impl UndoAction {
        pub fn label(self) -> String {
            match self {
                UndoAction::Checkpoint => "checkpoint".to_string(),
                UndoAction::Continue(mode) => format!("continue:{}", mode.as_str()),
                UndoAction::Rollback => "rollback".to_string(),
                UndoAction::Keylock => "keylock".to_string(),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn status_round_trips() {
            for status in [CriterionStatus::Proposed, CriterionStatus::Final] {
                assert_eq!(CriterionStatus::parse(status.as_str()), Some(status));
            }
            assert_eq!(CriterionStatus::parse("proposed"), None);
            assert_eq!(CriterionStatus::parse(""), None);
        }

        #[test]
        fn mode_round_trips() {
            for mode in [
                StepMode::Analyze,
                StepMode::Apply,
                StepMode::Test,
                StepMode::Rollback,
            ] {
                assert_eq!(StepMode::parse(mode.as_str()), Some(mode));
            }
            assert_eq!(StepMode::parse("Analyze"), None);
        }

        #[test]
        fn continue_label_embeds_mode() {
            assert_eq!(
                UndoAction::Continue(StepMode::Apply).label(),
                "continue:apply"
            );
            assert_eq!(UndoAction::Keylock.label(), "keylock");
        }
    }
}

pub mod criteria {
    //! Line classifier for archive entries: extracts checklist-like lines as
    //! acceptance criteria. The rules are deliberately narrow and there is no
    //! continuation-line support; lines that match neither rule are ignored.

    /// Extract acceptance criteria from the text of one archive entry.
    ///
    /// Per trimmed line:
    /// - blank lines are ignored;
    /// - a line starting with `-` or `*` contributes the line with all
    ///   leading `-`, `*` and space characters stripped;
    /// - a line whose first char is an ASCII digit and whose *second* char is
    ///   `.` or whitespace is a numbered item: split once on the first
    ///   whitespace run, the remainder (if any) is the criterion verbatim.
    ///
    /// The numbered rule inspects only the second character, so two-digit
    /// markers like `12.` never match, and `1.Only` (no whitespace at all)
    /// yields nothing.
    pub fn extract_criteria(text: &str) -> Vec<String> {
        let mut out = Vec::new();
        for line in text.lines() {
            let stripped = line.trim();
            if stripped.is_empty() {
                continue;
            }
            if stripped.starts_with('-') || stripped.starts_with('*') {
                let item = stripped.trim_start_matches(['-', '*', ' ']).trim();
                out.push(item.to_string());
                continue;
            }
            if is_numbered_item(stripped) {
                if let Some(rest) = split_after_marker(stripped) {
                    out.push(rest.to_string());
                }
            }
        }
        out
    }

    fn is_numbered_item(stripped: &str) -> bool {
        let mut chars = stripped.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        if !first.is_ascii_digit() {
            return false;
        }
        match chars.next() {
            Some(second) => second == '.' || second.is_whitespace(),
            None => false,
        }
    }

    /// Split on the first whitespace run and return the remainder, mirroring
    /// a single-split on unbounded whitespace. The marker token keeps
    /// whatever separator characters precede the whitespace (so `1. x`
    /// yields `x`, while `1 . x` yields `. x`).
    fn split_after_marker(stripped: &str) -> Option<&str> {
        let idx = stripped.find(char::is_whitespace)?;
        let rest = stripped[idx..].trim_start();
        if rest.is_empty() { None } else { Some(rest) }
    }

}
