use lazy_static::lazy_static;
use prometheus::{register_counter, register_counter_vec, Counter, CounterVec};

lazy_static! {
    // ── Expiry sweep ────────────────────────────────────────────────────────
    pub static ref SWEEP_RUNS_COUNTER: CounterVec = register_counter_vec!(
        "breaking_news_sweep_runs_total",
        "Expiry sweep ticks by status",
        &["status"]
    ).unwrap();

    pub static ref SWEEP_DEACTIVATED_COUNTER: Counter = register_counter!(
        "breaking_news_sweep_deactivated_total",
        "Posts deactivated because their expiration passed"
    ).unwrap();

    // ── Editor and render paths ─────────────────────────────────────────────
    pub static ref SAVES_COUNTER: CounterVec = register_counter_vec!(
        "breaking_news_saves_total",
        "Breaking news attribute saves by outcome",
        &["outcome"]
    ).unwrap();

    pub static ref BANNER_PLACEMENTS_COUNTER: CounterVec = register_counter_vec!(
        "breaking_news_banner_placements_total",
        "Banners placed into rendered pages by placement",
        &["placement"]
    ).unwrap();
}
