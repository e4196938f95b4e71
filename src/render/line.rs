//! Body lines and the placeholder rules for optional counterparties.
//!
//! Trade owners and transfer endpoints always get a line, with `None` standing
//! in for an absent account. The winner line only appears once a taker exists.

use std::fmt;

use crate::types::Account;

/// Placeholder shown for an absent counterparty.
pub(super) const NONE: &str = "None";

/// Single labelled line of the message body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BodyLine {
    label: &'static str,
    value: String,
    link: Option<String>,
}

impl BodyLine {
    pub(super) fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
            link: None,
        }
    }

    pub(super) fn linked(
        label: &'static str,
        value: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            label,
            value: value.into(),
            link: Some(link.into()),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    /// `**Label:** value`, wrapped in a link when the line has one.
    pub fn to_markdown(&self) -> String {
        match &self.link {
            Some(link) => format!("[**{}:** {}]({})", self.label, self.value, link),
            None => format!("**{}:** {}", self.label, self.value),
        }
    }
}

impl fmt::Display for BodyLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WhenAbsent {
    Placeholder,
    Omit,
}

/// How a counterparty line renders.
#[derive(Clone, Copy, Debug)]
pub(super) struct LineRule {
    label: &'static str,
    when_absent: WhenAbsent,
}

pub(super) const OWNER: LineRule = LineRule {
    label: "Owner",
    when_absent: WhenAbsent::Placeholder,
};

pub(super) const WINNER: LineRule = LineRule {
    label: "Winner",
    when_absent: WhenAbsent::Omit,
};

pub(super) const FROM: LineRule = LineRule {
    label: "From",
    when_absent: WhenAbsent::Placeholder,
};

pub(super) const TO: LineRule = LineRule {
    label: "To",
    when_absent: WhenAbsent::Placeholder,
};

impl LineRule {
    pub(super) fn render(&self, account: Option<&Account>) -> Option<BodyLine> {
        match (account, self.when_absent) {
            (Some(account), _) => Some(BodyLine::new(self.label, account.address.as_str())),
            (None, WhenAbsent::Placeholder) => Some(BodyLine::new(self.label, NONE)),
            (None, WhenAbsent::Omit) => None,
        }
    }
}

/// Counterparty address, or the placeholder.
pub(super) fn address(account: Option<&Account>) -> &str {
    account.map_or(NONE, |account| account.address.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(address: &str) -> Account {
        Account {
            address: address.to_string(),
        }
    }

    #[test]
    fn test_rules_with_account() {
        let maker = account("0xmaker");
        for rule in [OWNER, WINNER, FROM, TO] {
            let line = rule.render(Some(&maker)).unwrap();
            assert_eq!(line.value(), "0xmaker");
            assert_eq!(line.to_string(), format!("{}: 0xmaker", rule.label));
        }
    }

    #[test]
    fn test_rules_without_account() {
        assert_eq!(OWNER.render(None).unwrap().to_string(), "Owner: None");
        assert_eq!(FROM.render(None).unwrap().to_string(), "From: None");
        assert_eq!(TO.render(None).unwrap().to_string(), "To: None");
        assert_eq!(WINNER.render(None), None);
    }

    #[test]
    fn test_markdown() {
        assert_eq!(
            BodyLine::new("Owner", "0xabc").to_markdown(),
            "**Owner:** 0xabc"
        );
        assert_eq!(
            BodyLine::linked("Name", "Cat #1", "https://x/1").to_markdown(),
            "[**Name:** Cat #1](https://x/1)"
        );
    }

    #[test]
    fn test_address_placeholder() {
        assert_eq!(address(None), "None");
        assert_eq!(address(Some(&account("0x1"))), "0x1");
    }
}
