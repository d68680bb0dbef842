//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter      | Implements                  | Connects to                     |
//! |--------------|-----------------------------|---------------------------------|
//! | `hal_i2c`    | I2cBus                      | any `embedded_hal::i2c::I2c`    |
//! | `w1_sysfs`   | OneWireBus                  | `/sys/bus/w1/devices`           |
//! | `iio_dht`    | HumidityTemperatureSensor   | kernel `dht11` IIO driver       |
//! | `serial`     | SerialPort                  | RS-485 adapter via `serialport` |
//! | `linux`      | all bus ports               | the real field station          |
//! | `http`       | HttpClient                  | `ureq`, HTTP or HTTPS           |
//! | `thingspeak` | RemoteSink                  | ThingSpeak channel update API   |
//! | `csv_log`    | LocalSink                   | append-only CSV file            |
//! | `log_sink`   | LocalSink                   | console via `log`               |
//! | `sim`        | I2cBus · SerialPort         | simulated field station         |
//! |              | HumidityTemperatureSensor   |                                 |
//! |              | OneWireBus                  |                                 |
//! | `delay`      | `embedded_hal::delay::DelayNs` | `std::thread::sleep`         |

pub mod csv_log;
pub mod delay;
pub mod hal_i2c;
pub mod http;
pub mod iio_dht;
#[cfg(target_os = "linux")]
pub mod linux;
pub mod log_sink;
pub mod serial;
pub mod sim;
pub mod thingspeak;
pub mod w1_sysfs;
