//! Unit tests for reading and decoding measurements

use crate::common::{assert_close, create_mock_driver, create_mock_driver_with,
                    polling_config, read_meas, MockError};
use rm3100::{Axis, Error, Poll, Register, Rm3100Config};

#[test]
fn test_continuous_mode_reads_all_axes_in_order() {
    let (mut driver, device) = create_mock_driver();
    device.set_measurement(Register::MEAS_X, 75);
    device.set_measurement(Register::MEAS_Y, -150);
    device.set_measurement(Register::MEAS_Z, 7500);

    let field = driver.read_measurement().unwrap();

    assert_close(field.x.unwrap(), 1.0);
    assert_close(field.y.unwrap(), -2.0);
    assert_close(field.z.unwrap(), 100.0);
    assert_eq!(device.operations(),
               vec![read_meas(Register::MEAS_X),
                    read_meas(Register::MEAS_Y),
                    read_meas(Register::MEAS_Z),]);
}

#[test]
fn test_raw_counts_cover_24_bit_range() {
    let (mut driver, device) = create_mock_driver();
    device.set_measurement(Register::MEAS_X, -(1 << 23));
    device.set_measurement(Register::MEAS_Y, (1 << 23) - 1);
    device.set_measurement(Register::MEAS_Z, -1);

    let raw = driver.read_measurement_raw().unwrap();

    assert_eq!(raw.x, Some(-8_388_608));
    assert_eq!(raw.y, Some(8_388_607));
    assert_eq!(raw.z, Some(-1));
}

#[test]
fn test_scale_follows_cycle_count() {
    let mut config = Rm3100Config::default();
    config.set_axis_cycle_counts(Some(400), Some(100), None).unwrap();
    let (mut driver, device) = create_mock_driver_with(config);
    device.set_measurement(Register::MEAS_X, 150);
    device.set_measurement(Register::MEAS_Y, 150);
    device.set_measurement(Register::MEAS_Z, 150);

    let field = driver.read_measurement().unwrap();

    assert_close(field.x.unwrap(), 1.0);
    assert_close(field.y.unwrap(), 4.0);
    assert_close(field.z.unwrap(), 2.0);
}

#[test]
fn test_disabled_axes_are_not_read() {
    let (mut driver, device) = create_mock_driver_with(polling_config());

    let field = driver.read_measurement().unwrap();

    assert_eq!(field.x, None);
    assert_eq!(field.y, None);
    assert_eq!(field.z, None);
    assert!(device.operations().is_empty());
}

#[test]
fn test_z_axis_follows_its_own_continuous_flag() {
    let mut config = Rm3100Config::default();
    config.set_continuous_mode(false, true, false, true, true);
    let (mut driver, device) = create_mock_driver_with(config);
    device.set_measurement(Register::MEAS_Y, 75);

    assert_eq!(driver.read_axis(Axis::Z).unwrap(), None);
    assert!(device.operations().is_empty());

    assert_close(driver.read_axis(Axis::Y).unwrap().unwrap(), 1.0);
    assert_eq!(device.operations(), vec![read_meas(Register::MEAS_Y)]);
}

#[test]
fn test_single_shot_is_consumed_by_read() {
    let mut config = polling_config();
    config.set_single_shot_request(true, false, false);
    let (mut driver, device) = create_mock_driver_with(config);
    device.set_measurement(Register::MEAS_X, 300);

    assert_close(driver.read_axis(Axis::X).unwrap().unwrap(), 4.0);
    assert!(driver.config().single_shot().is_empty());

    device.clear_operations();
    assert_eq!(driver.read_axis(Axis::X).unwrap(), None);
    assert!(device.operations().is_empty());
}

#[test]
fn test_single_shot_only_consumes_read_axes() {
    let mut config = polling_config();
    config.set_single_shot_request(true, true, true);
    let (mut driver, _device) = create_mock_driver_with(config);

    driver.read_axis(Axis::Y).unwrap();

    assert_eq!(driver.config().single_shot(), Poll::PMX | Poll::PMZ);
}

#[test]
fn test_single_shot_pending_with_continuous_mode_is_cleared() {
    let mut config = Rm3100Config::default();
    config.set_single_shot_request(false, false, true);
    let (mut driver, device) = create_mock_driver_with(config);

    driver.read_measurement().unwrap();

    assert!(driver.config().single_shot().is_empty());
    // still read in continuous mode
    device.clear_operations();
    driver.read_axis(Axis::Z).unwrap();
    assert_eq!(device.operations(), vec![read_meas(Register::MEAS_Z)]);
}

#[test]
fn test_failed_read_keeps_single_shot_pending() {
    let mut config = polling_config();
    config.set_single_shot_request(true, false, false);
    let (mut driver, device) = create_mock_driver_with(config);
    device.fail_after(0);

    assert_eq!(driver.read_axis(Axis::X),
               Err(Error::Bus(MockError::Nack)));
    assert_eq!(driver.config().single_shot(), Poll::PMX);

    device.set_measurement(Register::MEAS_X, 75);
    assert_close(driver.read_axis(Axis::X).unwrap().unwrap(), 1.0);
    assert!(driver.config().single_shot().is_empty());
}

#[test]
fn test_read_measurement_stops_at_bus_error() {
    let (mut driver, device) = create_mock_driver();
    device.fail_after(1);

    assert_eq!(driver.read_measurement(), Err(Error::Bus(MockError::Nack)));
    assert_eq!(device.operations(), vec![read_meas(Register::MEAS_X)]);
}
