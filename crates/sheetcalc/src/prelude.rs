//! Prelude module - common imports for sheetcalc users
//!
//! ```rust
//! use sheetcalc::prelude::*;
//! ```

pub use crate::{
    // Addressing
    CellAddress,
    CellRange,

    // Cell types
    CellError,
    CellRecord,
    CellStyle,
    CellValue,
    HorizontalAlignment,

    // Engine
    Engine,
    EngineOptions,
    Recalc,
    SheetDocument,

    // Error types
    Error,
    Result,
};
