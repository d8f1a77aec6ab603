pub struct Icons;

impl Icons {
    pub const TICKET: &str = "🎫";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const FILE: &str = "📄";
    pub const TROPHY: &str = "🏆";
    pub const EMPTY: &str = "∅";
}
