/// Supplies asset and gas prices to the fee calculator. Zero means
/// "unknown" and degrades dependent fee computations to zero, rather than
/// panicking, so a stale oracle never wedges the pipeline.
pub trait PriceTracker: Send + Sync {
    fn asset_price(&self, asset_id: u32) -> u128;
    fn gas_price(&self) -> u128;
}
