//! 週排程格線示例

use anyhow::Context;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;
use weekgrid::{
    GridCalculator, GridConfig, MachineRegistry, OperatingHours, Reassignment, ScheduleBoard,
    ScheduleMode, WeekId, WorkOrder,
};

const MACHINES_JSON: &str = r#"{
    "itrak": { "line5": true, "line6": true, "line7": true },
    "swab": { "swabauto": true }
}"#;

const SCHEDULE_JSON: &str = r#"{
    "mon_start_time": "06:00", "mon_end_time": "23:00",
    "tue_start_time": "06:00", "tue_end_time": "23:00",
    "wed_start_time": "06:00", "wed_end_time": "23:00",
    "thu_start_time": "06:00", "thu_end_time": "23:00",
    "fri_start_time": "06:00", "fri_end_time": "23:00"
}"#;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("=== 週排程格線示例 ===\n");

    // 機台與班表設定
    let registry = MachineRegistry::from_json(MACHINES_JSON)?;
    let family = registry
        .family("itrak")
        .context("設定檔缺少 itrak 族群")?
        .clone();
    let hours = OperatingHours::from_json("PLANT-1".to_string(), SCHEDULE_JSON)?;
    let calculator = GridCalculator::new(family, hours, GridConfig::default())?;

    let day = |d: u32, h: u32| {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .and_then(|date| date.and_hms_opt(h, 0, 0))
            .context("無效的日期")
    };

    // 工單
    let board = ScheduleBoard::new(calculator).with_orders(vec![
        WorkOrder::new(1001, "A12".to_string(), "STRIP".to_string()).assigned(
            "line5",
            day(9, 8)?,
            day(9, 14)?,
        ),
        WorkOrder::new(1002, "A13".to_string(), "STRIP".to_string()).assigned(
            "line6",
            day(7, 20)?,
            day(8, 3)?,
        ),
        WorkOrder::new(1003, "B01".to_string(), "SWAB".to_string())
            .with_quantities(Decimal::from(1500), Decimal::from(500)),
    ])?;

    let week: WeekId = "2024-02".parse()?;
    let now = day(9, 10)?;

    // 把停車場工單排到 line7 佇列，依剩餘工時自動排時
    let plan = board.schedule_job(1003, "line7", ScheduleMode::Append, now)?;
    for order in &plan.queue {
        println!(
            "line7 順位 {:?}: 工單 {} {:?}",
            order.priority,
            order.lot_number,
            order.interval()
        );
    }

    // 手動拖放到其他時段
    let start = day(10, 6)?;
    let end = day(10, 9)?;
    board.reassign(1001, &Reassignment::retime(start, end), now)?;

    let grid = board.render(week, now)?;

    println!("週次: {} ({})", grid.week.year_week, grid.label);
    println!("時態: {:?}，目前欄: {:?}", grid.schedule_tense, grid.current_grid_column);
    for placement in &grid.placements {
        println!(
            "  - 工單 {} 列 {} 欄 [{}, {})",
            placement.lot_number, placement.row, placement.span.start, placement.span.end
        );
    }
    println!("需重繪機台列: {:?}", board.take_dirty_rows()?);
    println!("待持久化指派紀錄: {} 筆\n", board.take_journal()?.len());

    println!("{}", serde_json::to_string_pretty(&grid)?);

    Ok(())
}
