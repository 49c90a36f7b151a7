/// Route the UI shows when no authenticated session exists.
pub const LOGIN_ROUTE: &str = "/login";

/// Route shown after a successful sign-in.
pub const DASHBOARD_ROUTE: &str = "/dashboard";

/// Symbol displayed for a holding whose security record is missing.
pub const UNKNOWN_SYMBOL: &str = "N/A";

/// Decimal places kept for gain percentages and weights (stored as ratios).
pub const RATIO_PRECISION: u32 = 4;

/// Decimal precision for display
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;
