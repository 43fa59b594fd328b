//! 数据模型：幻灯片、调研结果、设计系统、演示文稿

pub mod slide;

pub use slide::{
    ConfidenceLevel, DesignOption, DesignSystem, Presentation, ResearchResult, Slide,
    SlideContent, SlideType,
};
