//! # photo-archive CLI
//!
//! Command-line interface for the photo archiver.
//!
//! ## Usage
//! ```bash
//! photo-archive copy ~/Pictures ~/Archive --from 2012-05-01 --to 2012-06-01
//! photo-archive duplicates ~/Pictures ~/Backups --output json
//! ```

mod cli;

use photo_archiver::Result;

fn main() -> Result<()> {
    cli::run()
}
