// ==========================================
// 生产追溯系统 - 引擎层
// ==========================================
// 职责: 扫码校验规则与容器状态机,不拼 SQL
// 红线: Engine 不拼 SQL, 所有扫码结果必须输出 reason
// ==========================================

pub mod archiver;
pub mod batch_code_parser;
pub mod date_cipher;
pub mod fill_tracker;
pub mod identifier_validator;
pub mod scan_processor;
pub mod trace_query;

// 重导出核心引擎
pub use archiver::RecordArchiver;
pub use batch_code_parser::{
    BatchCodeParser, BatchPayload, PalletPayload, PayloadRejection, PayloadRules,
};
pub use date_cipher::{
    BmwCipher, DateCiphers, DateWindow, FordCipher, FordLayout, MAX_WINDOW_DAYS,
};
pub use fill_tracker::ContainerFillTracker;
pub use identifier_validator::IdentifierValidator;
pub use scan_processor::ScanProcessor;
pub use trace_query::TraceQueryService;
