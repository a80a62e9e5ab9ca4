//! Cross-module scenarios: layout through projection to annotations

mod end_to_end;
