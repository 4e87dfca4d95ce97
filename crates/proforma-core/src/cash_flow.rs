use crate::types::CashFlowVector;

/// The assembled money movements for one trial.
#[derive(Debug, Clone)]
pub struct TrialCashFlows {
    /// NOI for years 1..=N.
    pub noi_path: Vec<f64>,
    /// Terminal NOI capitalized at the sampled exit rate.
    pub sale_price: f64,
    /// [-purchase_price, NOI_1, .., NOI_{N-1}, NOI_N + sale_price]
    pub cash_flows: CashFlowVector,
}

/// Build one trial's cash-flow vector from its sampled draws.
///
/// Growth rates are cumulative since purchase, so each year's NOI is the
/// base NOI escalated by that year's draw: NOI_t = N0 * (1 + g_t). A deeply
/// negative draw legitimately produces negative NOI and is preserved.
///
/// A near-zero exit cap makes the sale price blow up; the value is
/// propagated as-is and the IRR solver's failure semantics surface it.
pub fn assemble_trial(
    purchase_price: f64,
    current_noi: f64,
    growth_draws: &[f64],
    exit_cap: f64,
) -> TrialCashFlows {
    let n = growth_draws.len();
    let noi_path: Vec<f64> = growth_draws
        .iter()
        .map(|g| current_noi + current_noi * g)
        .collect();

    let terminal_noi = noi_path.last().copied().unwrap_or(current_noi);
    let sale_price = terminal_noi / exit_cap;

    let mut cash_flows = Vec::with_capacity(n + 1);
    cash_flows.push(-purchase_price);
    for (t, &noi) in noi_path.iter().enumerate() {
        if t + 1 == n {
            cash_flows.push(noi + sale_price);
        } else {
            cash_flows.push(noi);
        }
    }

    TrialCashFlows {
        noi_path,
        sale_price,
        cash_flows,
    }
}
