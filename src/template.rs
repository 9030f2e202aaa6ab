//! Declarative section templates for the two business schemas.
//!
//! A template lists, per part of the agreement, the bordered sections to draw
//! and for each row the label, the source key(s) and how to format the value.
//! The renderer walks it; nothing here draws.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::Error;
use crate::model::{FieldMap, FieldValue, SectionBlock};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    /// Lease agreement: landlord/tenant split, single transfer-fee string.
    #[default]
    V1,
    /// Sale agreement: seller/buyer split, multi-select transfer fee, property flags.
    V2,
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaVersion::V1 => write!(f, "v1"),
            SchemaVersion::V2 => write!(f, "v2"),
        }
    }
}

impl FromStr for SchemaVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(SchemaVersion::V1),
            "v2" | "2" => Ok(SchemaVersion::V2),
            other => Err(format!("unknown schema version `{other}` (expected v1 or v2)")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Booleans, or the form strings "yes"/"no".
    YesNo,
    /// Suffixed with " %".
    Percent,
    /// Shown as submitted; ISO dates are normalised to YYYY-MM-DD.
    Date,
    /// Multi-select, shown joined with " & ".
    Choices,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldSource {
    Key(String),
    /// Two keys shown together, e.g. "phone | email".
    Joined {
        first: String,
        separator: String,
        second: String,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldSpec {
    pub label: String,
    pub source: FieldSource,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn new(label: impl Into<String>, key: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            label: label.into(),
            source: FieldSource::Key(key.into()),
            kind,
        }
    }

    pub fn text(label: impl Into<String>, key: impl Into<String>) -> Self {
        Self::new(label, key, FieldKind::Text)
    }

    pub fn joined(
        label: impl Into<String>,
        first: impl Into<String>,
        separator: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            source: FieldSource::Joined {
                first: first.into(),
                separator: separator.into(),
                second: second.into(),
            },
            kind: FieldKind::Text,
        }
    }

    fn keys(&self) -> Vec<&str> {
        match &self.source {
            FieldSource::Key(k) => vec![k.as_str()],
            FieldSource::Joined { first, second, .. } => vec![first.as_str(), second.as_str()],
        }
    }

    /// Display text for this row. `None` when every source value is null.
    pub(crate) fn value(&self, fields: &FieldMap, schema: SchemaVersion) -> Result<Option<String>, Error> {
        match &self.source {
            FieldSource::Key(key) => {
                let value = lookup(fields, key, schema)?;
                if value.is_null() {
                    return Ok(None);
                }
                Ok(Some(format_value(value, self.kind)))
            }
            FieldSource::Joined {
                first,
                separator,
                second,
            } => {
                let parts: Vec<String> = [first, second]
                    .into_iter()
                    .map(|key| lookup(fields, key, schema).map(|v| format_value(v, self.kind)))
                    .collect::<Result<Vec<_>, _>>()?
                    .into_iter()
                    .filter(|s| !s.is_empty())
                    .collect();
                if parts.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(parts.join(separator)))
                }
            }
        }
    }
}

fn lookup<'a>(fields: &'a FieldMap, key: &str, schema: SchemaVersion) -> Result<&'a FieldValue, Error> {
    fields.get(key).ok_or_else(|| Error::MissingField {
        key: key.to_string(),
        schema,
    })
}

fn format_value(value: &FieldValue, kind: FieldKind) -> String {
    match (kind, value) {
        (FieldKind::YesNo, FieldValue::Text(s)) => {
            if s.trim().eq_ignore_ascii_case("yes") || s.trim().eq_ignore_ascii_case("true") {
                "Yes".to_string()
            } else {
                "No".to_string()
            }
        }
        (FieldKind::Percent, v) => {
            let shown = v.display();
            if shown.is_empty() {
                shown
            } else {
                format!("{shown} %")
            }
        }
        // Day/month order of other spellings is ambiguous, so they stay verbatim.
        (FieldKind::Date, FieldValue::Text(s)) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|_| s.clone()),
        (_, v) => v.display(),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SectionTemplate {
    pub title: String,
    pub fields: Vec<FieldSpec>,
}

impl SectionTemplate {
    pub fn new(title: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            title: title.into(),
            fields,
        }
    }

    pub(crate) fn compose(&self, fields: &FieldMap, schema: SchemaVersion) -> Result<SectionBlock, Error> {
        self.fields.iter().try_fold(SectionBlock::new(&self.title), |block, spec| -> Result<SectionBlock, Error> {
            Ok(block.row(&spec.label, spec.value(fields, schema)?))
        })
    }
}

/// A numbered part of the agreement: a heading followed by one or more
/// bordered sections.
#[derive(Clone, Debug, PartialEq)]
pub struct PartTemplate {
    pub heading: String,
    pub sections: Vec<SectionTemplate>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SignatureTemplate {
    pub heading: String,
    /// Notice paragraph lines; an empty line is a small vertical gap.
    pub notice: Vec<String>,
    pub agent_a: (String, String),
    pub agent_b: (String, String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct AgreementTemplate {
    pub version: SchemaVersion,
    pub date_key: String,
    pub parties: PartTemplate,
    pub property: PartTemplate,
    pub commission: PartTemplate,
    pub signatures: SignatureTemplate,
}

impl AgreementTemplate {
    pub fn for_version(version: SchemaVersion) -> Self {
        match version {
            SchemaVersion::V1 => Self::v1(),
            SchemaVersion::V2 => Self::v2(),
        }
    }

    /// The parts drawn as bordered sections, in document order.
    pub fn parts(&self) -> [&PartTemplate; 3] {
        [&self.parties, &self.property, &self.commission]
    }

    /// Every field key the template reads, in first-use order.
    pub fn referenced_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = vec![self.date_key.as_str()];
        for part in self.parts() {
            for section in &part.sections {
                for spec in &section.fields {
                    keys.extend(spec.keys());
                }
            }
        }
        keys.push(self.signatures.agent_a.1.as_str());
        keys.push(self.signatures.agent_b.1.as_str());

        let mut seen = std::collections::HashSet::new();
        keys.retain(|k| seen.insert(*k));
        keys
    }

    /// Fails on the first referenced key that is absent from `fields`.
    pub fn validate(&self, fields: &FieldMap) -> Result<(), Error> {
        match self.referenced_keys().into_iter().find(|k| !fields.contains_key(*k)) {
            Some(key) => Err(Error::MissingField {
                key: key.to_string(),
                schema: self.version,
            }),
            None => Ok(()),
        }
    }

    pub fn v1() -> Self {
        Self {
            version: SchemaVersion::V1,
            date_key: "dated".to_string(),
            parties: PartTemplate {
                heading: "PART 1 - THE PARTIES".to_string(),
                sections: vec![
                    agent_section("A) THE AGENT (LANDLORD'S AGENT)", "agent_a", false),
                    agent_section("B) THE AGENT (TENANT'S AGENT)", "agent_b", false),
                ],
            },
            property: PartTemplate {
                heading: "PART 2 - THE PROPERTY".to_string(),
                sections: vec![SectionTemplate::new(
                    "PROPERTY DETAILS",
                    vec![
                        FieldSpec::text("Address", "property_address"),
                        FieldSpec::text("Building", "building_name"),
                        FieldSpec::text("Price", "listed_price"),
                        FieldSpec::text("Description", "property_description"),
                    ],
                )],
            },
            commission: PartTemplate {
                heading: "PART 3 - THE COMMISSION".to_string(),
                sections: vec![SectionTemplate::new(
                    "COMMISSION DETAILS",
                    vec![
                        FieldSpec::text("Landlord %", "landlord_agent_percent"),
                        FieldSpec::new("Tenant %", "tenant_agent_percent", FieldKind::Percent),
                        FieldSpec::text("Tenant", "tenant_name"),
                        FieldSpec::text("Passport", "tenant_passport"),
                        FieldSpec::text("Budget", "tenant_budget"),
                        FieldSpec::text("Transfer Fee", "transfer_fee_paid_by"),
                        FieldSpec::new("Contacted Agent", "tenant_contacted_agent", FieldKind::YesNo),
                    ],
                )],
            },
            signatures: signature_part(),
        }
    }

    pub fn v2() -> Self {
        Self {
            version: SchemaVersion::V2,
            date_key: "dated".to_string(),
            parties: PartTemplate {
                heading: "PART 1 - THE PARTIES".to_string(),
                sections: vec![
                    agent_section("A) THE AGENT (SELLER'S AGENT)", "agent_a", true),
                    agent_section("B) THE AGENT (BUYER'S AGENT)", "agent_b", true),
                ],
            },
            property: PartTemplate {
                heading: "PART 2 - THE PROPERTY".to_string(),
                sections: vec![SectionTemplate::new(
                    "PROPERTY DETAILS",
                    vec![
                        FieldSpec::text("Address", "property_address"),
                        FieldSpec::text("Master Developer", "master_developer"),
                        FieldSpec::text("Master Project", "master_project"),
                        FieldSpec::text("Building", "building_name"),
                        FieldSpec::text("Listed Price", "listed_price"),
                        FieldSpec::text("Description", "property_description"),
                        FieldSpec::new("Tenanted", "property_tenanted", FieldKind::YesNo),
                        FieldSpec::new("Mortgaged", "property_mortgaged", FieldKind::YesNo),
                    ],
                )],
            },
            commission: PartTemplate {
                heading: "PART 3 - THE COMMISSION".to_string(),
                sections: vec![SectionTemplate::new(
                    "COMMISSION DETAILS",
                    vec![
                        FieldSpec::new("Seller's Agent %", "seller_agent_percent", FieldKind::Percent),
                        FieldSpec::new("Buyer's Agent %", "buyer_agent_percent", FieldKind::Percent),
                        FieldSpec::text("Buyer", "buyer_name"),
                        FieldSpec::text("Passport", "buyer_passport"),
                        FieldSpec::text("Budget", "buyer_budget"),
                        FieldSpec::new("Transfer Fee Paid By", "transfer_fee_paid_by", FieldKind::Choices),
                        FieldSpec::new("Contacted Agent", "buyer_contacted_agent", FieldKind::YesNo),
                    ],
                )],
            },
            signatures: signature_part(),
        }
    }
}

fn agent_section(title: &str, prefix: &str, with_orn: bool) -> SectionTemplate {
    let key = |name: &str| format!("{prefix}_{name}");
    let mut fields = vec![
        FieldSpec::text("Establishment", key("establishment")),
        FieldSpec::text("Address", key("address")),
        FieldSpec::joined("Contact", key("phone"), " | ", key("email")),
    ];
    if with_orn {
        fields.push(FieldSpec::text("ORN", key("orn")));
    }
    fields.extend([
        FieldSpec::text("License", key("license")),
        FieldSpec::text("Agent", key("name")),
        FieldSpec::text("BRN", key("brn")),
        FieldSpec::text("Mobile", key("mobile")),
    ]);
    SectionTemplate::new(title, fields)
}

fn signature_part() -> SignatureTemplate {
    SignatureTemplate {
        heading: "PART 4 - SIGNATURES".to_string(),
        notice: [
            "Both Agents are required to co-operate fully, complete this FORM & BOTH retain",
            "a fully signed & stamped copy on file. RERA DRS is available to both parties.",
            "(Office Stamps 'X' above).",
            "",
            "IN THE EVENT AGENT A DOES NOT RESPOND WITHIN 24 HOURS,",
            "AGENT B MUST CONTACT RERA",
        ]
        .into_iter()
        .map(String::from)
        .collect(),
        agent_a: ("Agent A".to_string(), "agent_a_signature".to_string()),
        agent_b: ("Agent B".to_string(), "agent_b_signature".to_string()),
    }
}
