//! Forward amortization: a receive pulled later by its message reveals clock skew of the
//! whole process, so the same amount is folded into the offset applied to every later event.

use tracesync_proto::Timestamp;

use crate::corrector::ReceiveCorrection;

/// New time offset after a receive correction. Only the part of the correction caused by the
/// message counts; spacing the corrector would have applied anyway is not skew.
pub fn amortize(time_offset: Timestamp, correction: &ReceiveCorrection) -> Timestamp { time_offset.saturating_add(correction.message_jump()) }
