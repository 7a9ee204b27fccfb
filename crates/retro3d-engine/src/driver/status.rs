use std::fmt;

/// Raw status code returned by a driver call.
///
/// Follows the HRESULT convention of fixed-function drivers: zero is success,
/// negative values are failures. The engine never interprets codes beyond
/// success/failure; they travel unchanged inside [`crate::Error::Subsystem`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Status(pub i32);

const fn dd(code: u32) -> Status {
    Status((0x8876_0000 | code) as i32)
}

impl Status {
    pub const OK: Status = Status(0);

    pub const INVALID_PARAMS: Status = Status(0x8007_0057_u32 as i32);
    pub const OUT_OF_MEMORY: Status = Status(0x8007_000E_u32 as i32);
    pub const INVALID_OBJECT: Status = dd(130);
    pub const NOT_FOUND: Status = dd(255);
    pub const SURFACE_ALREADY_ATTACHED: Status = dd(410);
    pub const SURFACE_BUSY: Status = dd(430);
    pub const INVALID_CALL: Status = dd(600);
    pub const SCENE_IN_SCENE: Status = dd(750);
    pub const SCENE_NOT_IN_SCENE: Status = dd(751);
    pub const ALREADY_IN_PRIMITIVE: Status = dd(770);
    pub const NOT_IN_PRIMITIVE: Status = dd(771);

    #[inline]
    pub const fn is_ok(self) -> bool {
        self.0 >= 0
    }

    #[inline]
    pub const fn is_failure(self) -> bool {
        self.0 < 0
    }

    /// Symbolic name for the codes this crate knows about.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Status::OK => "OK",
            Status::INVALID_PARAMS => "INVALID_PARAMS",
            Status::OUT_OF_MEMORY => "OUT_OF_MEMORY",
            Status::INVALID_OBJECT => "INVALID_OBJECT",
            Status::NOT_FOUND => "NOT_FOUND",
            Status::SURFACE_ALREADY_ATTACHED => "SURFACE_ALREADY_ATTACHED",
            Status::SURFACE_BUSY => "SURFACE_BUSY",
            Status::INVALID_CALL => "INVALID_CALL",
            Status::SCENE_IN_SCENE => "SCENE_IN_SCENE",
            Status::SCENE_NOT_IN_SCENE => "SCENE_NOT_IN_SCENE",
            Status::ALREADY_IN_PRIMITIVE => "ALREADY_IN_PRIMITIVE",
            Status::NOT_IN_PRIMITIVE => "NOT_IN_PRIMITIVE",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} (0x{:08X})", self.0 as u32),
            None => write!(f, "0x{:08X}", self.0 as u32),
        }
    }
}

/// Result of a single driver call.
pub type DriverResult<T> = std::result::Result<T, Status>;
