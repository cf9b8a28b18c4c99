// ABOUTME: Counter helpers over the `metrics` facade
// ABOUTME: No-ops unless the host process installs a recorder

use metrics::counter;

pub fn record_broadcast_requested() {
    counter!("tagall_broadcasts_requested_total").increment(1);
}

pub fn record_broadcast_denied() {
    counter!("tagall_broadcasts_denied_total").increment(1);
}

pub fn record_chunks_scheduled(count: usize) {
    counter!("tagall_chunks_scheduled_total").increment(count as u64);
}

/// `outcome` is "ok" or "failed"
pub fn record_chunk_send(outcome: &'static str) {
    counter!("tagall_chunk_sends_total", "outcome" => outcome).increment(1);
}

/// `outcome` is "ok", "transport", "status", "decode" or "timeout"
pub fn record_directory_lookup(outcome: &'static str) {
    counter!("tagall_directory_lookups_total", "outcome" => outcome).increment(1);
}

pub fn record_role_mutation(role: &'static str, outcome: &'static str) {
    counter!("tagall_role_mutations_total", "role" => role, "outcome" => outcome).increment(1);
}

pub fn record_schedule_error(kind: &'static str) {
    counter!("tagall_schedule_errors_total", "kind" => kind).increment(1);
}
