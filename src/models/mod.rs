// Row types, request payloads and the pure logic around them

pub mod detail;
pub mod pagination;
pub mod ranking;
pub mod settings;
pub mod summary;
pub mod validation;
pub mod workout;

pub use detail::{ChartData, WorkoutDetail};
pub use pagination::{Page, PageQuery};
pub use ranking::{RankingBoard, RankingSetting, RankingsResponse};
pub use settings::UserSetting;
pub use summary::{PeriodTotals, SummaryPage};
pub use workout::{EquipmentType, Workout, WorkoutListItem};
