pub mod daily;
pub mod late_night;
pub mod monthly;

pub use daily::{compute_daily, shift_bounds};
pub use late_night::late_night_minutes;
pub use monthly::{apply_regime, compute_monthly, fold_days};
