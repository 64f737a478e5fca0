//! Webhook body parsing.

use crate::{
    error::{Error, Result},
    types::{Mention, MentionBatch},
};

/// Parse a webhook body: an array of envelopes, or a single envelope.
///
/// The array form is tried first so a single object is never mistaken for a
/// malformed array. A JSON `null` body is an empty envelope.
pub fn parse_batches(body: &[u8]) -> Result<Vec<MentionBatch>> {
    match serde_json::from_slice::<Vec<MentionBatch>>(body) {
        Ok(batches) => Ok(batches),
        Err(_) => serde_json::from_slice::<Option<MentionBatch>>(body)
            .map(|batch| vec![batch.unwrap_or_default()])
            .map_err(|e| Error::BadRequest(e.to_string())),
    }
}

/// Concatenate every envelope's mentions in order and compute the reported
/// `received` figure: the sum of positive declared counts, or the number of
/// mentions when nothing was declared. The sum saturates instead of
/// overflowing.
pub fn flatten(batches: Vec<MentionBatch>) -> (usize, Vec<Mention>) {
    let declared = batches
        .iter()
        .fold(0i64, |sum, b| sum.saturating_add(b.count.max(0)));
    let mentions: Vec<Mention> = batches.into_iter().flat_map(|b| b.mentions).collect();
    let received = match declared {
        0 => mentions.len(),
        n => usize::try_from(n).unwrap_or(usize::MAX),
    };
    (received, mentions)
}
