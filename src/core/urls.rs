#[derive(Debug)]
pub struct ApiUrls;

impl ApiUrls {
    // Records - JSON APIs
    pub const TASKS: &'static str = "/api/tasks";
    pub const CRONOGRAMA: &'static str = "/api/cronograma";
    pub const RESULTADOS: &'static str = "/api/resultados";
    pub const CHECKLIST: &'static str = "/api/checklist";
    pub const AGENDA: &'static str = "/api/agenda";
    pub const USERS: &'static str = "/api/users";

    // Dashboards - JSON APIs
    pub const DASHBOARD_PROGRESS: &'static str = "/api/dashboard/progress";
    pub const DASHBOARD_TEAM: &'static str = "/api/dashboard/team";

    // Notifications - JSON APIs
    pub const NOTIFICATIONS: &'static str = "/api/notifications";

    pub const HEALTH: &'static str = "/api/health";
}
