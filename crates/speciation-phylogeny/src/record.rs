//! Per-species descriptive records for external logging and analysis.
//!
//! A [`SpeciesRecord`] is a point-in-time snapshot: identifier, traits,
//! footprint size and group count at a reporting date. It renders as a
//! tag-delimited text record and serializes to JSON through `serde`. Records
//! describe; they are not meant to rebuild a tree.

use serde::Serialize;

use speciation_types::{Date, SpeciesId};

/// Snapshot of one species at a reporting date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeciesRecord {
    /// Species identifier.
    pub id: SpeciesId,
    /// Display name (`s<id>`).
    pub name: String,
    /// Date the snapshot describes.
    pub date: Date,
    /// Trait vector at that date.
    pub traits: Vec<f64>,
    /// Number of occupied locations.
    pub location_count: usize,
    /// Number of connected groups, `None` if the cache was stale.
    pub group_count: Option<usize>,
}

impl SpeciesRecord {
    /// Render the record as a tag-delimited text element.
    ///
    /// ```text
    /// <species id="3" name="s3" date="120"><traits>0.1 -0.2</traits><locations>5</locations><groups>2</groups></species>
    /// ```
    ///
    /// A stale group count renders as `<groups stale="true"/>`.
    pub fn to_tagged(&self) -> String {
        self.to_string()
    }
}

impl core::fmt::Display for SpeciesRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            r#"<species id="{}" name="{}" date="{}"><traits>"#,
            self.id, self.name, self.date
        )?;
        for (i, value) in self.traits.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, "</traits><locations>{}</locations>", self.location_count)?;
        match self.group_count {
            Some(groups) => write!(f, "<groups>{groups}</groups>")?,
            None => f.write_str(r#"<groups stale="true"/>"#)?,
        }
        f.write_str("</species>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(group_count: Option<usize>) -> SpeciesRecord {
        SpeciesRecord {
            id: SpeciesId::new(3),
            name: "s3".to_string(),
            date: 120,
            traits: vec![0.1, -0.2],
            location_count: 5,
            group_count,
        }
    }

    #[test]
    fn tagged_record_layout() {
        assert_eq!(
            make_record(Some(2)).to_tagged(),
            r#"<species id="3" name="s3" date="120"><traits>0.1 -0.2</traits><locations>5</locations><groups>2</groups></species>"#
        );
    }

    #[test]
    fn stale_groups_are_flagged() {
        let text = make_record(None).to_string();
        assert!(text.contains(r#"<groups stale="true"/>"#));
    }

    #[test]
    fn record_serializes_to_json() {
        let json = serde_json::to_value(make_record(Some(2))).ok();
        assert_eq!(
            json,
            Some(serde_json::json!({
                "id": 3,
                "name": "s3",
                "date": 120,
                "traits": [0.1, -0.2],
                "location_count": 5,
                "group_count": 2,
            }))
        );
    }
}
