use std::io;
use std::process::{Child, Command, Stdio};

// RAII (Resource Acquisition Is Initialization)
// When this struct is dropped, the chromedriver process is terminated
pub struct DriverProcess {
    child: Option<Child>,
    port: u16,
}

impl DriverProcess {
    pub fn new(command: &str, desired_port: u16) -> io::Result<Self> {
        // Pin chromedriver to a known port so the session URL is predictable
        let child = Command::new(command)
            .arg(format!("--port={}", desired_port))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        Ok(DriverProcess {
            child: Some(child),
            port: desired_port,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Drop for DriverProcess {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill(); // Kill child process
            let _ = child.wait(); // Wait for the process to terminate
        }
    }
}
