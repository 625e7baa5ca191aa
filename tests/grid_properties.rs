//! 格線性質測試

use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use weekgrid::*;

const MACHINES: [&str; 3] = ["line5", "line6", "line7"];

fn monday() -> NaiveDateTime {
    // 2024-02 週一
    NaiveDate::from_ymd_opt(2024, 1, 8)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn calculator(cols_per_hour: u32, minute_precision: bool) -> GridCalculator {
    let family = MachineFamily::new("itrak", &MACHINES).unwrap();
    let config = GridConfig::new()
        .with_cols_per_hour(cols_per_hour)
        .with_minute_precision(minute_precision);
    GridCalculator::new(family, OperatingHours::default(), config).unwrap()
}

fn cols_per_hour() -> impl Strategy<Value = u32> {
    prop::sample::select(vec![1u32, 2, 3, 4, 6, 12])
}

/// 相對週一的分鐘偏移，涵蓋前後各一週
fn offset_minutes() -> impl Strategy<Value = i64> {
    -7 * 24 * 60i64..14 * 24 * 60
}

fn order_strategy(lot_number: u64) -> impl Strategy<Value = WorkOrder> {
    (
        prop::option::of(0..MACHINES.len()),
        offset_minutes(),
        1i64..72 * 60,
    )
        .prop_map(move |(machine, offset, length)| {
            let order = WorkOrder::new(lot_number, format!("L{lot_number}"), "STRIP".to_string());
            match machine {
                Some(row) => {
                    let start = monday() + Duration::minutes(offset);
                    order.assigned(MACHINES[row], start, start + Duration::minutes(length))
                }
                None => order,
            }
        })
}

fn orders_strategy() -> impl Strategy<Value = Vec<WorkOrder>> {
    (0u64..12).prop_flat_map(|count| (1..=count).map(order_strategy).collect::<Vec<_>>())
}

proptest! {
    #[test]
    fn prop_grid_dimensions_are_consistent(cph in cols_per_hour(), minutes in any::<bool>()) {
        let grid = calculator(cph, minutes).build("2024-02".parse().unwrap(), &[], monday()).unwrap();

        prop_assert_eq!(grid.cols_per_day, grid.cols_per_hour * 24);
        prop_assert_eq!(grid.cols_per_week, grid.cols_per_day * 7);
        prop_assert_eq!(grid.schedule_mask.len(), grid.cols_per_week);
    }

    #[test]
    fn prop_spans_stay_inside_week(
        cph in cols_per_hour(),
        minutes in any::<bool>(),
        orders in orders_strategy(),
    ) {
        let grid = calculator(cph, minutes).build("2024-02".parse().unwrap(), &orders, monday()).unwrap();

        prop_assert!(grid.errors.is_empty());
        for placement in &grid.placements {
            prop_assert!(placement.span.start < placement.span.end);
            prop_assert!(placement.span.end <= grid.cols_per_week);
            prop_assert!(placement.row < MACHINES.len());
        }
    }

    #[test]
    fn prop_build_is_idempotent(orders in orders_strategy(), now_offset in offset_minutes()) {
        let calc = calculator(1, false);
        let now = monday() + Duration::minutes(now_offset);

        let first = calc.build("2024-02".parse().unwrap(), &orders, now).unwrap();
        let second = calc.build("2024-02".parse().unwrap(), &orders, now).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_parking_lot_is_exactly_unassigned_in_order(orders in orders_strategy()) {
        let grid = calculator(1, false).build("2024-02".parse().unwrap(), &orders, monday()).unwrap();

        let expected: Vec<u64> = orders
            .iter()
            .filter(|o| !o.is_assigned())
            .map(|o| o.lot_number)
            .collect();
        let parked: Vec<u64> = grid.parking_lot.iter().map(|o| o.lot_number).collect();
        prop_assert_eq!(parked, expected);

        for placement in &grid.placements {
            prop_assert!(!grid.parking_lot.iter().any(|o| o.lot_number == placement.lot_number));
        }
    }

    #[test]
    fn prop_orders_crossing_the_week_seam_are_continuous(
        cph in cols_per_hour(),
        before in 1i64..5 * 24 * 60,
        after in 1i64..5 * 24 * 60,
    ) {
        let seam = monday() + Duration::days(7);
        let order = WorkOrder::new(1, "L1".to_string(), "STRIP".to_string())
            .assigned("line6", seam - Duration::minutes(before), seam + Duration::minutes(after));
        let grids = calculator(cph, false)
            .build_outlook("2024-02".parse().unwrap(), 2, &[order], monday())
            .unwrap();

        let this_week = grids[0].placement(1).unwrap();
        let next_week = grids[1].placement(1).unwrap();
        prop_assert_eq!(this_week.span.end, grids[0].cols_per_week);
        prop_assert_eq!(next_week.span.start, 0);
    }

    #[test]
    fn prop_reassign_rejects_inverted_interval(
        start_offset in offset_minutes(),
        back in 0i64..48 * 60,
    ) {
        let family = MachineFamily::new("itrak", &MACHINES).unwrap();
        let mut order = WorkOrder::new(1, "L1".to_string(), "STRIP".to_string())
            .assigned("line5", monday(), monday() + Duration::hours(4));
        let before = order.clone();

        let start = monday() + Duration::minutes(start_offset);
        let change = Reassignment::retime(start, start - Duration::minutes(back));

        prop_assert!(matches!(
            reassign(&mut order, &change, &family),
            Err(GridError::InvalidAssignment(_))
        ));
        prop_assert_eq!(order, before);
    }

    #[test]
    fn prop_reassign_rejects_machines_outside_family(name in "[a-z]{1,8}[0-9]{0,2}") {
        prop_assume!(!MACHINES.contains(&name.as_str()));
        let family = MachineFamily::new("itrak", &MACHINES).unwrap();
        let mut order = WorkOrder::new(1, "L1".to_string(), "STRIP".to_string())
            .assigned("line5", monday(), monday() + Duration::hours(4));
        let before = order.clone();

        prop_assert!(reassign(&mut order, &Reassignment::to_machine(name), &family).is_err());
        prop_assert_eq!(order, before);
    }
}
