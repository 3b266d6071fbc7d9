use hostpulse::system::accelerator::parse_reading;
use hostpulse::system::snapshot::{Accelerator, CpuUsage, MemoryUsage};
use insta::assert_debug_snapshot;
use proptest::prelude::*;

#[test]
fn reference_reading_snapshot() {
    let reading = parse_reading("NVIDIA RTX 3080,10240,2048,45");
    assert_debug_snapshot!("rtx_3080_reading", reading);
}

#[test]
fn windows_line_endings_are_tolerated() {
    let reading = parse_reading("Quadro P620, 2048, 100, 0\r\n");
    let Accelerator::Present(info) = reading else {
        panic!("expected a reading");
    };
    assert_eq!(info.name, "Quadro P620");
    assert_eq!(info.load_percent, 0.0);
}

proptest! {
    #[test]
    fn four_fields_parse_in_order(
        name in "[A-Za-z][A-Za-z0-9 ]{0,24}[A-Za-z0-9]",
        total in 0.0f64..1.0e6,
        used in 0.0f64..1.0e6,
        load in 0.0f64..=100.0,
    ) {
        let line = format!("{name}, {total}, {used}, {load}\n");
        match parse_reading(&line) {
            Accelerator::Present(info) => {
                prop_assert_eq!(info.name, name);
                prop_assert_eq!(info.memory_total_mib, total);
                prop_assert_eq!(info.memory_used_mib, used);
                prop_assert_eq!(info.load_percent, load);
            }
            other => prop_assert!(false, "expected a reading, got {:?}", other),
        }
    }

    #[test]
    fn fewer_than_four_fields_is_absent(fields in prop::collection::vec("[^,\n]{0,12}", 0..4)) {
        let line = fields.join(",");
        prop_assert_eq!(parse_reading(&line), Accelerator::Absent);
    }

    #[test]
    fn cpu_used_and_free_sum_to_hundred(used in 0.0f32..=100.0) {
        let cpu = CpuUsage::new(used);
        prop_assert_eq!(cpu.used_percent + cpu.free_percent(), 100.0);
    }

    #[test]
    fn memory_parts_sum_to_total(total in any::<u64>(), available in any::<u64>()) {
        let memory = MemoryUsage::from_total_and_available(total, available);
        prop_assert_eq!(memory.used_bytes + memory.free_bytes, memory.total_bytes);
    }
}
