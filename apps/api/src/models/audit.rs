use uuid::Uuid;

/// One row of the append-only `security_audit_logs` table.
#[derive(Debug, Clone)]
pub struct NewAuditLogEntry {
    pub user_id: Uuid,
    pub action: &'static str,
    pub resource: &'static str,
    pub ip_address: String,
    pub user_agent: String,
}
