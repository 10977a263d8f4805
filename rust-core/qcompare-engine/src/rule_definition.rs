// SPDX-License-Identifier: PMPL-1.0-or-later
//! Rule definition documents
//!
//! Detection rules carry their logic as an embedded XML document:
//!
//! ```xml
//! <rule id="100" buildingBlock="false" enabled="true">
//!   <name>Excessive Firewall Denies</name>
//!   <testDefinitions>
//!     <test name="com.q1labs.semsources.cre.tests.RuleMatch_Test" uid="3" id="47">
//!       <parameter id="1"><userSelection>0</userSelection></parameter>
//!       <parameter id="2"><userSelection>BB:Deny, BB:Reject</userSelection></parameter>
//!     </test>
//!   </testDefinitions>
//! </rule>
//! ```
//!
//! The document is parsed once during denormalization into a
//! [`RuleDefinition`]. Only the condition list is modelled; comparison looks
//! at the number of conditions and at the building blocks referenced by the
//! rule-match condition. Other condition types are not diffed.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::report::FieldDelta;

/// Condition that enumerates the building blocks a rule depends on.
pub const RULE_MATCH_TEST: &str = "com.q1labs.semsources.cre.tests.RuleMatch_Test";

/// Position of the building-block selection among a rule-match test's parameters.
const BUILDING_BLOCK_PARAMETER: usize = 1;

/// Rule definition parse errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleDefinitionError {
    #[error("XML parse error at byte {position}: {message}")]
    Xml { position: u64, message: String },

    #[error("document has no <rule> root element")]
    MissingRoot,
}

/// One parameter of a rule condition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleParameter {
    pub id: Option<i64>,
    pub user_selection: String,
}

/// One condition (`<test>`) of a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTest {
    pub name: String,
    pub uid: Option<i64>,
    pub parameters: Vec<RuleParameter>,
}

impl RuleTest {
    pub fn is_rule_match(&self) -> bool {
        self.name == RULE_MATCH_TEST
    }

    /// Number of building blocks referenced by a rule-match condition.
    ///
    /// An empty selection counts as zero, not as one blank entry. Only the
    /// displayed counts depend on this; whether two counts differ does not.
    pub fn building_block_count(&self) -> usize {
        self.parameters
            .get(BUILDING_BLOCK_PARAMETER)
            .map(|p| {
                p.user_selection
                    .split(',')
                    .filter(|entry| !entry.trim().is_empty())
                    .count()
            })
            .unwrap_or(0)
    }
}

/// Parsed rule definition document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub name: String,
    pub tests: Vec<RuleTest>,
}

impl RuleDefinition {
    /// Parse a rule definition document.
    pub fn parse(xml: &str) -> Result<Self, RuleDefinitionError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut definition = RuleDefinition::default();
        let mut seen_root = false;
        let mut path: Vec<String> = Vec::new();

        loop {
            let event = reader.read_event().map_err(|e| RuleDefinitionError::Xml {
                position: reader.buffer_position() as u64,
                message: e.to_string(),
            })?;

            match event {
                Event::Start(e) => {
                    let name = local_name(&e);
                    definition.open(&path, &name, &e, &mut seen_root);
                    path.push(name);
                }
                Event::Empty(e) => {
                    let name = local_name(&e);
                    definition.open(&path, &name, &e, &mut seen_root);
                }
                Event::End(_) => {
                    path.pop();
                }
                Event::Text(e) => {
                    let text = e.unescape().map_err(|err| RuleDefinitionError::Xml {
                        position: reader.buffer_position() as u64,
                        message: err.to_string(),
                    })?;
                    definition.text(&path, &text);
                }
                Event::CData(e) => {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    definition.text(&path, &text);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if seen_root {
            Ok(definition)
        } else {
            Err(RuleDefinitionError::MissingRoot)
        }
    }

    fn open(&mut self, path: &[String], name: &str, element: &BytesStart<'_>, seen_root: &mut bool) {
        match (path, name) {
            ([], "rule") => *seen_root = true,
            ([.., parent], "test") if parent == "testDefinitions" => {
                self.tests.push(RuleTest {
                    name: attribute(element, "name").unwrap_or_default(),
                    uid: attribute(element, "uid").and_then(|v| v.parse().ok()),
                    parameters: Vec::new(),
                });
            }
            ([.., parent], "parameter") if parent == "test" => {
                if let Some(test) = self.tests.last_mut() {
                    test.parameters.push(RuleParameter {
                        id: attribute(element, "id").and_then(|v| v.parse().ok()),
                        user_selection: String::new(),
                    });
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, path: &[String], text: &str) {
        match path {
            [root, name] if root == "rule" && name == "name" => self.name.push_str(text),
            [.., parameter, selection] if parameter == "parameter" && selection == "userSelection" => {
                if let Some(param) = self
                    .tests
                    .last_mut()
                    .and_then(|test| test.parameters.last_mut())
                {
                    param.user_selection.push_str(text);
                }
            }
            _ => {}
        }
    }

    /// Drift between two definitions of the same rule.
    ///
    /// A differing number of conditions is reported alone. Otherwise every
    /// rule-match condition is paired by `uid` and a differing number of
    /// referenced building blocks is reported.
    pub fn compare(&self, new: &RuleDefinition) -> Vec<FieldDelta> {
        if self.tests.len() != new.tests.len() {
            return vec![FieldDelta::new(
                "Number of Conditions",
                self.tests.len().to_string(),
                new.tests.len().to_string(),
            )];
        }

        self.tests
            .iter()
            .filter(|test| test.is_rule_match())
            .filter_map(|old_test| {
                let new_test = new
                    .tests
                    .iter()
                    .find(|t| t.is_rule_match() && t.uid == old_test.uid)?;
                let (old_count, new_count) =
                    (old_test.building_block_count(), new_test.building_block_count());
                (old_count != new_count).then(|| {
                    FieldDelta::new(
                        "Number of Building Blocks",
                        old_count.to_string(),
                        new_count.to_string(),
                    )
                })
            })
            .collect()
    }
}

fn local_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

fn attribute(element: &BytesStart<'_>, key: &str) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == key.as_bytes())
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(blocks: &str, extra_test: bool) -> String {
        let extra = if extra_test {
            r#"<test name="com.q1labs.semsources.cre.tests.EventProperty_Test" uid="9" id="1"/>"#
        } else {
            ""
        };
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rule id="100" enabled="true" buildingBlock="false">
  <name>Excessive Denies</name>
  <notes>watch &amp; alert</notes>
  <testDefinitions>
    <test name="{RULE_MATCH_TEST}" uid="3" id="47">
      <text>when an event matches any of the following rules</text>
      <parameter id="1"><initialText>any</initialText><userSelection>0</userSelection><name>count</name></parameter>
      <parameter id="2"><userSelection>{blocks}</userSelection></parameter>
    </test>
    {extra}
  </testDefinitions>
</rule>"#
        )
    }

    #[test]
    fn test_parse_conditions() {
        let definition = RuleDefinition::parse(&rule("BB:Deny, BB:Reject", true)).unwrap();
        assert_eq!(definition.name, "Excessive Denies");
        assert_eq!(definition.tests.len(), 2);

        let rule_match = &definition.tests[0];
        assert!(rule_match.is_rule_match());
        assert_eq!(rule_match.uid, Some(3));
        assert_eq!(rule_match.parameters.len(), 2);
        assert_eq!(rule_match.parameters[1].user_selection, "BB:Deny, BB:Reject");
        assert_eq!(rule_match.building_block_count(), 2);
        assert_eq!(definition.tests[1].uid, Some(9));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(RuleDefinition::parse("<rule><name>x</rule>").is_err());
        assert_eq!(
            RuleDefinition::parse("<other/>"),
            Err(RuleDefinitionError::MissingRoot)
        );
    }

    #[test]
    fn test_compare_condition_count() {
        let old = RuleDefinition::parse(&rule("BB:Deny", true)).unwrap();
        let new = RuleDefinition::parse(&rule("BB:Deny, BB:Reject", false)).unwrap();
        let deltas = old.compare(&new);
        assert_eq!(
            deltas,
            vec![FieldDelta::new("Number of Conditions", "2", "1")]
        );
    }

    #[test]
    fn test_compare_building_block_count() {
        let old = RuleDefinition::parse(&rule("BB:Deny", false)).unwrap();
        let new = RuleDefinition::parse(&rule("BB:Deny, BB:Reject", false)).unwrap();
        assert_eq!(
            old.compare(&new),
            vec![FieldDelta::new("Number of Building Blocks", "1", "2")]
        );
        assert!(old.compare(&old).is_empty());
    }

    #[test]
    fn test_empty_selection_counts_zero() {
        let empty = RuleDefinition::parse(&rule("", false)).unwrap();
        assert_eq!(empty.tests[0].building_block_count(), 0);

        let one = RuleDefinition::parse(&rule("BB:Deny", false)).unwrap();
        assert_eq!(
            empty.compare(&one),
            vec![FieldDelta::new("Number of Building Blocks", "0", "1")]
        );
    }
}
