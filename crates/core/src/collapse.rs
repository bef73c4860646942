//! Revision grouping and collapse.
//!
//! Archive import and reporting paths work over flat sequences of stored
//! documents that mix many identities and many revisions. The helpers here
//! regroup such a sequence by identity and reduce each group to its winning
//! revision: the maximum `_rev`, with a tie broken by the lexicographically
//! greatest `_id`. Ties cannot arise from a store that enforced revision
//! uniqueness, but archives assembled by hand can contain them, and the
//! collapse must still be deterministic.

use std::collections::BTreeMap;

use crate::document::{Document, Identity, Revision, ID_FIELD, REV_FIELD};
use crate::error::{StoreError, StoreResult};
use chartstore_ident::RecordId;

/// Groups stored documents by identity.
///
/// Within each group, documents are ordered by ascending (`_rev`, `_id`), so
/// the last element of a group is the one [`collapse_revisions`] keeps.
///
/// # Errors
///
/// `StoreError::InvalidEnvelope` if any document is missing or malformed in
/// `_type`, `_id`, or `_rev`.
pub fn group_by_identity(
    documents: Vec<Document>,
) -> StoreResult<BTreeMap<Identity, Vec<Document>>> {
    let mut groups: BTreeMap<Identity, Vec<(Revision, RecordId, Document)>> = BTreeMap::new();
    for document in documents {
        let identity = document.identity()?;
        let rev = document.rev()?.ok_or_else(|| {
            StoreError::InvalidEnvelope(format!("document is missing {REV_FIELD}"))
        })?;
        let id = document.id()?.ok_or_else(|| {
            StoreError::InvalidEnvelope(format!("document is missing {ID_FIELD}"))
        })?;
        groups.entry(identity).or_default().push((rev, id, document));
    }

    let mut sorted = BTreeMap::new();
    for (identity, mut members) in groups {
        members.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));
        sorted.insert(
            identity,
            members.into_iter().map(|(_, _, document)| document).collect(),
        );
    }
    Ok(sorted)
}

/// Reduces a flat sequence of stored documents to one winning revision per
/// identity, ordered by identity.
pub fn collapse_revisions(documents: Vec<Document>) -> StoreResult<Vec<Document>> {
    let groups = group_by_identity(documents)?;
    let mut collapsed = Vec::with_capacity(groups.len());
    for (_, mut members) in groups {
        if let Some(winner) = members.pop() {
            collapsed.push(winner);
        }
    }
    Ok(collapsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ID_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const ID_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
    const ID_C: &str = "cccccccccccccccccccccccccccccccc";
    const SET_1: &str = "11111111111111111111111111111111";

    fn singleton(document_type: &str, id: &str, rev: u64) -> Document {
        Document::from_value(json!({
            "_id": id,
            "_rev": rev,
            "_type": document_type,
        }))
        .unwrap()
    }

    fn set_element(document_type: &str, set_id: &str, id: &str, rev: u64) -> Document {
        Document::from_value(json!({
            "_id": id,
            "_rev": rev,
            "_type": document_type,
            "_set_id": set_id,
        }))
        .unwrap()
    }

    #[test]
    fn groups_separate_singletons_from_set_elements_of_the_same_type() {
        let groups = group_by_identity(vec![
            singleton("assessment", ID_A, 1),
            set_element("assessment", SET_1, ID_B, 1),
        ])
        .unwrap();
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn collapse_keeps_the_maximum_revision_regardless_of_input_order() {
        let collapsed = collapse_revisions(vec![
            singleton("profile", ID_A, 1),
            singleton("profile", ID_C, 3),
            singleton("profile", ID_B, 2),
        ])
        .unwrap();
        assert_eq!(collapsed.len(), 1);
        assert_eq!(collapsed[0].rev().unwrap().unwrap().get(), 3);
        assert_eq!(collapsed[0].id().unwrap().unwrap().as_str(), ID_C);
    }

    #[test]
    fn revision_tie_breaks_on_the_greatest_id() {
        let collapsed = collapse_revisions(vec![
            singleton("profile", ID_B, 2),
            singleton("profile", ID_A, 2),
        ])
        .unwrap();
        assert_eq!(collapsed[0].id().unwrap().unwrap().as_str(), ID_B);
    }

    #[test]
    fn collapse_covers_every_identity() {
        let collapsed = collapse_revisions(vec![
            singleton("profile", ID_A, 1),
            set_element("session", SET_1, ID_B, 1),
            set_element("session", SET_1, ID_C, 2),
        ])
        .unwrap();
        assert_eq!(collapsed.len(), 2);
        let sessions: Vec<_> = collapsed
            .iter()
            .filter(|d| d.is_set_element())
            .collect();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].rev().unwrap().unwrap().get(), 2);
    }

    #[test]
    fn documents_without_an_envelope_are_rejected() {
        let stray = Document::from_value(json!({"note": "no envelope"})).unwrap();
        assert!(matches!(
            collapse_revisions(vec![stray]),
            Err(StoreError::InvalidEnvelope(_))
        ));
    }

    #[test]
    fn group_members_are_ordered_by_revision() {
        let groups = group_by_identity(vec![
            singleton("profile", ID_C, 3),
            singleton("profile", ID_A, 1),
            singleton("profile", ID_B, 2),
        ])
        .unwrap();
        let members = groups.values().next().unwrap();
        let revs: Vec<u64> = members
            .iter()
            .map(|d| d.rev().unwrap().unwrap().get())
            .collect();
        assert_eq!(revs, vec![1, 2, 3]);
    }
}
