//! 技能层：不持有决策日志的无状态能力
//!
//! - **structure**: 调研结果 → 幻灯片结构
//! - **design**: 配色、字体、版式模板、对比度校验
//! - **export**: Presentation → JSON / Markdown 文件

pub mod design;
pub mod export;
pub mod structure;

pub use design::{ColorPalette, DesignSkill, LayoutTemplate};
pub use export::{safe_topic, ExportFormat, Exporter, JsonExporter, MarkdownExporter};
pub use structure::StructureSkill;
