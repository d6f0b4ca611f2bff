//! Linux SMBus device implementation
//!
//! This module provides the `LinuxSmbus` struct that implements the
//! `SmbusMaster` trait using the i2c-dev `I2C_SMBUS` ioctl.

use crate::error::{Result, SmbusError};

use m37flash_core::error::{Error as CoreError, Result as CoreResult};
use m37flash_core::programmer::{SmbusMaster, SMBUS_BLOCK_MAX};

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;

/// Bus the battery is usually found on
pub const DEFAULT_BUS: u32 = 5;

/// Smart battery SMBus address
pub const DEFAULT_ADDRESS: u8 = 0x0B;

/// Linux i2c-dev ioctl constants
mod ioctl {
    use nix::{ioctl_read_bad, ioctl_write_int_bad, ioctl_write_ptr_bad};

    const I2C_SLAVE: u16 = 0x0703;
    const I2C_FUNCS: u16 = 0x0705;
    const I2C_SMBUS: u16 = 0x0720;

    pub const I2C_SMBUS_READ: u8 = 1;
    pub const I2C_SMBUS_WRITE: u8 = 0;
    pub const I2C_SMBUS_BLOCK_DATA: u32 = 5;

    pub const I2C_FUNC_SMBUS_READ_BLOCK_DATA: libc::c_ulong = 0x0100_0000;
    pub const I2C_FUNC_SMBUS_WRITE_BLOCK_DATA: libc::c_ulong = 0x0200_0000;

    /// Must match the kernel's `struct i2c_smbus_ioctl_data`
    #[repr(C)]
    pub struct I2cSmbusIoctlData {
        pub read_write: u8,
        pub command: u8,
        pub size: u32,
        pub data: *mut super::SmbusData,
    }

    ioctl_write_int_bad!(i2c_slave, I2C_SLAVE);
    ioctl_read_bad!(i2c_funcs, I2C_FUNCS, libc::c_ulong);
    ioctl_write_ptr_bad!(i2c_smbus, I2C_SMBUS, I2cSmbusIoctlData);
}

/// Block buffer of `union i2c_smbus_data`: length byte, 32 data bytes, PEC
#[repr(C)]
pub struct SmbusData {
    block: [u8; SMBUS_BLOCK_MAX + 2],
}

/// Configuration for opening a Linux SMBus device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinuxSmbusConfig {
    /// Device path (e.g., "/dev/i2c-5")
    pub device: String,
    /// 7-bit SMBus address of the battery controller
    pub address: u8,
}

impl Default for LinuxSmbusConfig {
    fn default() -> Self {
        Self::for_bus(DEFAULT_BUS)
    }
}

impl LinuxSmbusConfig {
    /// Configuration for `/dev/i2c-<bus>` at the default address
    pub fn for_bus(bus: u32) -> Self {
        Self {
            device: format!("/dev/i2c-{}", bus),
            address: DEFAULT_ADDRESS,
        }
    }

    /// Set the SMBus address
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }
}

/// SMBus adapter using the i2c-dev interface
pub struct LinuxSmbus {
    /// File handle for the i2c-dev device
    file: File,
    address: u8,
}

impl LinuxSmbus {
    /// Open an i2c-dev device with the given configuration
    pub fn open(config: &LinuxSmbusConfig) -> Result<Self> {
        log::debug!("smbus: Opening device {}", config.device);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&config.device)
            .map_err(|e| SmbusError::OpenFailed {
                path: config.device.clone(),
                source: e,
            })?;

        let fd = file.as_raw_fd();

        let mut funcs: libc::c_ulong = 0;
        match unsafe { ioctl::i2c_funcs(fd, &mut funcs) } {
            Ok(_) => {
                let needed = ioctl::I2C_FUNC_SMBUS_READ_BLOCK_DATA
                    | ioctl::I2C_FUNC_SMBUS_WRITE_BLOCK_DATA;
                if funcs & needed != needed {
                    return Err(SmbusError::Unsupported {
                        path: config.device.clone(),
                    });
                }
            }
            Err(e) => log::warn!("smbus: Cannot query adapter functionality: {}", e),
        }

        unsafe {
            ioctl::i2c_slave(fd, config.address as libc::c_int).map_err(|e| {
                SmbusError::SetAddressFailed {
                    address: config.address,
                    source: std::io::Error::from(e),
                }
            })?;
        }

        log::info!(
            "smbus: Opened {} (address 0x{:02X})",
            config.device,
            config.address
        );

        Ok(Self {
            file,
            address: config.address,
        })
    }

    /// SMBus address in use
    pub fn address(&self) -> u8 {
        self.address
    }

    fn smbus_access(&mut self, read_write: u8, command: u8, data: &mut SmbusData) -> Result<()> {
        let args = ioctl::I2cSmbusIoctlData {
            read_write,
            command,
            size: ioctl::I2C_SMBUS_BLOCK_DATA,
            data,
        };
        unsafe { ioctl::i2c_smbus(self.file.as_raw_fd(), &args) }
            .map(|_| ())
            .map_err(|e| SmbusError::TransferFailed {
                command,
                source: std::io::Error::from(e),
            })
    }

    /// SMBus block write
    pub fn write_block_data(&mut self, command: u8, data: &[u8]) -> Result<()> {
        if data.len() > SMBUS_BLOCK_MAX {
            return Err(SmbusError::InvalidParameter(format!(
                "block write of {} bytes exceeds {}",
                data.len(),
                SMBUS_BLOCK_MAX
            )));
        }
        let mut buf = SmbusData {
            block: [0; SMBUS_BLOCK_MAX + 2],
        };
        buf.block[0] = data.len() as u8;
        buf.block[1..=data.len()].copy_from_slice(data);
        self.smbus_access(ioctl::I2C_SMBUS_WRITE, command, &mut buf)
    }

    /// SMBus block read, returns the bytes the device sent
    pub fn read_block_data(&mut self, command: u8, out: &mut [u8]) -> Result<usize> {
        let mut buf = SmbusData {
            block: [0; SMBUS_BLOCK_MAX + 2],
        };
        self.smbus_access(ioctl::I2C_SMBUS_READ, command, &mut buf)?;
        let len = (buf.block[0] as usize).min(SMBUS_BLOCK_MAX).min(out.len());
        out[..len].copy_from_slice(&buf.block[1..=len]);
        Ok(len)
    }
}

impl SmbusMaster for LinuxSmbus {
    fn block_write(&mut self, command: u8, data: &[u8]) -> CoreResult<()> {
        self.write_block_data(command, data).map_err(|e| {
            log::error!("smbus: 0x{:02X}: {}", self.address(), e);
            CoreError::TransportError
        })
    }

    fn block_read(&mut self, command: u8, buf: &mut [u8]) -> CoreResult<usize> {
        self.read_block_data(command, buf).map_err(|e| {
            log::error!("smbus: 0x{:02X}: {}", self.address(), e);
            CoreError::TransportError
        })
    }
}

fn parse_u8(value: &str) -> std::result::Result<u8, std::num::ParseIntError> {
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => value.parse(),
    }
}

/// Parse programmer options from a list of key-value pairs
pub fn parse_options(options: &[(&str, &str)]) -> Result<LinuxSmbusConfig> {
    let mut config = LinuxSmbusConfig::default();
    let mut device = None;

    for (key, value) in options {
        match *key {
            "bus" => {
                let bus: u32 = value.parse().map_err(|_| {
                    SmbusError::InvalidParameter(format!("Invalid bus value: {}", value))
                })?;
                config.device = format!("/dev/i2c-{}", bus);
            }
            "dev" => device = Some(value.to_string()),
            "addr" | "address" => {
                let address = parse_u8(value).map_err(|_| {
                    SmbusError::InvalidParameter(format!("Invalid addr value: {}", value))
                })?;
                if address > 0x7F {
                    return Err(SmbusError::InvalidParameter(format!(
                        "SMBus address 0x{:02X} is not a 7-bit address",
                        address
                    )));
                }
                config.address = address;
            }
            _ => {
                log::warn!("smbus: Unknown option: {}={}", key, value);
            }
        }
    }

    if let Some(device) = device {
        config.device = device;
    }

    Ok(config)
}
