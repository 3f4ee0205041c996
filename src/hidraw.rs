// hidraw ioctl constants and the feature report transfer
use std::fs::OpenOptions;
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::Path;

/// Length of the TrackPoint settings feature report
pub const REPORT_LEN: usize = 5;

// Set feature report
pub const fn hidiocsfeature(len: usize) -> u64 {
    // _IOC(_IOC_WRITE | _IOC_READ, 'H', 0x06, len)
    0xc0000000 | ((len as u64 & 0x3fff) << 16) | (b'H' as u64) << 8 | 0x06
}

/// Pushes a feature report to a hidraw node
pub trait FeatureTransport {
    fn send_feature(&self, node: &Path, report: &[u8; REPORT_LEN]) -> io::Result<()>;
}

/// Real hidraw access: open, one ioctl, close
#[derive(Debug, Default, Clone, Copy)]
pub struct HidrawTransport;

impl FeatureTransport for HidrawTransport {
    fn send_feature(&self, node: &Path, report: &[u8; REPORT_LEN]) -> io::Result<()> {
        // Dropped at the end of this call whether or not the ioctl succeeds
        let file = OpenOptions::new().write(true).open(node)?;
        let mut buf = *report;

        let ret = unsafe {
            libc::ioctl(
                file.as_raw_fd(),
                hidiocsfeature(REPORT_LEN) as _,
                buf.as_mut_ptr(),
            )
        };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }

        tracing::trace!("HIDIOCSFEATURE on {} returned {}", node.display(), ret);
        Ok(())
    }
}
