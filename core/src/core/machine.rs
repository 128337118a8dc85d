use crate::cpu::z80::CpuError;
use crate::device::vdp::VideoError;

/// Describes a single input button that a machine accepts.
pub struct InputButton {
    /// Machine-defined button identifier, passed to `set_input()`.
    pub id: u8,
    /// Human-readable name for display/configuration (e.g., "P1 Left", "Pause").
    pub name: &'static str,
}

/// Fatal emulation faults surfaced by [`Machine::run_frame`].
///
/// Guest-benign events (ROM writes, reads from disabled memory) never reach
/// this type; they follow real-hardware semantics inside the bus.
#[derive(Debug)]
pub enum MachineError {
    /// The CPU hit a condition the core does not model (illegal prefix
    /// chain, unsupported interrupt mode).
    Cpu(CpuError),
    /// The video subsystem was driven into an unsupported configuration.
    Video(VideoError),
    /// The guest touched an I/O port the machine does not decode.
    UnmappedPort { port: u8, write: bool },
    /// A bounded run exhausted its T-state budget without terminating.
    DeadlineExceeded { tstates: u64 },
}

impl std::fmt::Display for MachineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cpu(e) => write!(f, "CPU fault: {e}"),
            Self::Video(e) => write!(f, "video fault: {e}"),
            Self::UnmappedPort { port, write } => {
                let dir = if *write { "write to" } else { "read from" };
                write!(f, "{dir} unmapped I/O port 0x{port:02X}")
            }
            Self::DeadlineExceeded { tstates } => {
                write!(f, "run did not terminate within {tstates} T-states")
            }
        }
    }
}

impl std::error::Error for MachineError {}

impl From<CpuError> for MachineError {
    fn from(e: CpuError) -> Self {
        Self::Cpu(e)
    }
}

impl From<VideoError> for MachineError {
    fn from(e: VideoError) -> Self {
        Self::Video(e)
    }
}

/// Machine-agnostic interface for emulated systems.
///
/// Each machine implements this trait to provide a uniform interface for the
/// host. The host is a pure driver that does not know about specific
/// hardware (mappers, VDP register files, palette formats).
pub trait Machine {
    /// Native display resolution as (width, height) in pixels.
    fn display_size(&self) -> (u32, u32);

    /// Run one frame of emulation (advance the clock by one frame's worth
    /// of cycles). Fatal faults abort the frame mid-instruction-stream;
    /// the machine state remains inspectable afterwards.
    fn run_frame(&mut self) -> Result<(), MachineError>;

    /// Render the current video state into an RGB24 pixel buffer.
    ///
    /// The buffer must be at least `width * height * 3` bytes (from
    /// `display_size()`), stored left-to-right, top-to-bottom.
    fn render_frame(&self, buffer: &mut [u8]);

    /// Handle an input event. `button` is a machine-defined ID from
    /// `input_map()`. `pressed` is true for key-down, false for key-up.
    /// Each call latches the button state so that `run_frame()` sees the
    /// accumulated input.
    fn set_input(&mut self, button: u8, pressed: bool);

    /// Get the list of input buttons this machine accepts.
    fn input_map(&self) -> &[InputButton];

    /// Reset the machine to its initial power-on state.
    fn reset(&mut self);
}
