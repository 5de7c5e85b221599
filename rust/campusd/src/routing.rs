use crate::notify::Notifier;
use crate::roster::Role;
use crate::session::SessionView;
use tracing::info;

pub const ENTRY_PATH: &str = "/";
pub const DASHBOARD_PATH: &str = "/dashboard";
pub const STUDENT_DASHBOARD_PATH: &str = "/student-dashboard";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Entry,
    ForgotPassword,
    Dashboard,
    StudentDashboard,
    Students,
    StudentNew,
    StudentEdit(String),
    Courses,
    Attendance,
    Facilities,
    FacilityNew,
    FacilityEdit(String),
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Public,
    Learner,
    Management,
    AdminOnly,
}

impl Route {
    pub fn parse(path: &str) -> Route {
        let trimmed = path.split(['?', '#']).next().unwrap_or("");
        let trimmed = trimmed.trim_end_matches('/');
        let segs: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();
        match segs.as_slice() {
            [] => Route::Entry,
            ["forgot-password"] => Route::ForgotPassword,
            ["dashboard"] => Route::Dashboard,
            ["student-dashboard"] => Route::StudentDashboard,
            ["students"] => Route::Students,
            ["students", "new"] => Route::StudentNew,
            ["students", "edit", id] => Route::StudentEdit((*id).to_string()),
            ["courses"] => Route::Courses,
            ["attendance"] => Route::Attendance,
            ["facilities"] => Route::Facilities,
            ["facilities", "new"] => Route::FacilityNew,
            ["facilities", "edit", id] => Route::FacilityEdit((*id).to_string()),
            _ => Route::NotFound,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Route::Entry => "entry",
            Route::ForgotPassword => "forgotPassword",
            Route::Dashboard => "dashboard",
            Route::StudentDashboard => "studentDashboard",
            Route::Students => "students",
            Route::StudentNew => "studentNew",
            Route::StudentEdit(_) => "studentEdit",
            Route::Courses => "courses",
            Route::Attendance => "attendance",
            Route::Facilities => "facilities",
            Route::FacilityNew => "facilityNew",
            Route::FacilityEdit(_) => "facilityEdit",
            Route::NotFound => "notFound",
        }
    }

    fn access(&self) -> Access {
        match self {
            Route::Entry | Route::ForgotPassword | Route::NotFound => Access::Public,
            Route::StudentDashboard => Access::Learner,
            Route::FacilityNew | Route::FacilityEdit(_) => Access::AdminOnly,
            Route::Dashboard
            | Route::Students
            | Route::StudentNew
            | Route::StudentEdit(_)
            | Route::Courses
            | Route::Attendance
            | Route::Facilities => Access::Management,
        }
    }
}

pub fn landing_path(role: Role) -> &'static str {
    if role.is_staff() {
        DASHBOARD_PATH
    } else {
        STUDENT_DASHBOARD_PATH
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect { to: &'static str },
}

impl RouteDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RouteDecision::Allow)
    }
}

/// Gate one route entry. Denied admin-only access raises a notification; the
/// other redirects are silent.
pub fn resolve(view: SessionView<'_>, route: &Route, notices: &mut Notifier) -> RouteDecision {
    let access = route.access();
    let Some(role) = view.role() else {
        return match access {
            Access::Public => RouteDecision::Allow,
            _ => RouteDecision::Redirect { to: ENTRY_PATH },
        };
    };

    match (access, route) {
        (Access::Public, Route::Entry) => RouteDecision::Redirect {
            to: landing_path(role),
        },
        (Access::Public, _) => RouteDecision::Allow,
        (Access::Learner, _) if role == Role::Student => RouteDecision::Allow,
        (Access::Learner, _) => RouteDecision::Redirect {
            to: landing_path(role),
        },
        (Access::AdminOnly, _) if role != Role::Admin => {
            info!(
                target: "campusd::routing",
                role = role.as_str(),
                route = route.name(),
                "admin-only route denied"
            );
            notices.destructive("Access Denied", "Only administrators can manage facilities");
            RouteDecision::Redirect {
                to: landing_path(role),
            }
        }
        (_, _) if !role.is_staff() => RouteDecision::Redirect {
            to: STUDENT_DASHBOARD_PATH,
        },
        _ => RouteDecision::Allow,
    }
}
