//! Raspberry Pi demo
//!
//! RM3100 connected on I2C1 with both SA0 and SA1 pulled high (address
//! 0x23).
//!
//! - PIN1 = 3V3 = VCC
//! - PIN3 = BCM2 = SDA
//! - PIN5 = BCM3 = SCL
//! - PIN6 = GND = GND

extern crate linux_embedded_hal as hal;
extern crate rm3100;

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use hal::Delay;
use hal::I2cdev;
use rm3100::{Axis, DeviceAddress, I2cDevice, Rm3100, Rm3100Config,
             SampleRate, SELF_TEST_ATTEMPTS};

fn main() -> io::Result<()> {
    let i2c = I2cdev::new("/dev/i2c-1").expect("unable to open /dev/i2c-1");

    let mut config = Rm3100Config::default();
    config.set_device_address(DeviceAddress::HH as u8)
          .expect("bad address")
          .set_axis_cycle_counts(Some(200), Some(200), Some(200))
          .expect("bad cycle counts")
          .set_single_shot_request(true, true, true)
          .set_bist_self_test_enable(true);

    let mut rm3100 = Rm3100::new(I2cDevice::new(i2c), config);
    let revid = rm3100.read_revid().expect("could not read REVID");
    println!("REVID: 0x{:x}", revid);

    let bist = rm3100.self_test(&mut Delay, SELF_TEST_ATTEMPTS)
                     .expect("self test did not finish");
    for axis in Axis::ALL {
        println!("self test {:?}: {}",
                 axis,
                 if bist.axis_ok(axis) { "ok" } else { "FAILED" });
    }

    rm3100.config_mut()
          .set_bist_self_test_enable(false)
          .set_single_shot_request(false, false, false)
          .set_continuous_mode(true, true, true, false, true)
          .set_sample_rate(SampleRate::_37HZ as u8)
          .expect("bad sample rate");
    rm3100.apply_configuration()
          .expect("unable to configure RM3100");

    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    writeln!(&mut stdout, "   Mag Field XYZ(uT)")?;
    loop {
        if !rm3100.data_ready().expect("unable to read STATUS") {
            thread::sleep(Duration::from_millis(5));
            continue;
        }
        let field = rm3100.read_measurement()
                          .expect("unable to read from RM3100!");
        write!(&mut stdout,
               "\r{:>8.2} {:>8.2} {:>8.2} ",
               field.x.unwrap_or(0.0),
               field.y.unwrap_or(0.0),
               field.z.unwrap_or(0.0))?;
        stdout.flush()?;
        thread::sleep(Duration::from_millis(100));
    }
}
