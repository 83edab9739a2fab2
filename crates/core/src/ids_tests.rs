use super::*;

#[test]
fn job_id_display_is_the_raw_number() {
    let id = JobId::new(42);
    assert_eq!(id.to_string(), "42");
    assert_eq!(id.get(), 42);
}

#[test]
fn monotonic_id_gen_never_repeats_or_goes_backwards() {
    let gen = MonotonicIdGen::new(1);
    let a = gen.next();
    let b = gen.next();
    let c = gen.next();
    assert!(a < b);
    assert!(b < c);
}

#[test]
fn ids_round_trip_through_json() {
    let id = ScheduleId::new(7);
    let json = serde_json::to_string(&id).expect("serialize");
    assert_eq!(json, "7");
    let back: ScheduleId = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, id);
}
