use super::*;

#[test]
fn eta_is_none_when_speed_is_zero_or_already_done() {
    let sample = JobMetricSample::builder().items_per_second(0.0).build();
    assert_eq!(sample.eta_seconds(10, 100), None);

    let sample = JobMetricSample::builder().items_per_second(5.0).build();
    assert_eq!(sample.eta_seconds(100, 100), None);
}

#[test]
fn eta_divides_remaining_work_by_rate() {
    let sample = JobMetricSample::builder().items_per_second(10.0).build();
    assert_eq!(sample.eta_seconds(50, 100), Some(5.0));
}
