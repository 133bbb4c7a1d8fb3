use crate::error::app_error::AppError;
use crate::session::{SessionData, SessionManager};
use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{FromRequest, Outcome as RequestOutcome, Request};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
    Customer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
            Role::Customer => "customer",
        }
    }

    /// Landing page after login.
    pub fn home_path(self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::Employee => "/employee",
            Role::Customer => "/customer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "employee" => Ok(Role::Employee),
            "customer" => Ok(Role::Customer),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Who is making the request. Derived from the session on every request,
/// never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Principal {
    #[default]
    Guest,
    Customer { id: i64 },
    Employee { id: i64 },
    Admin { id: i64 },
}

impl Principal {
    /// Absent sessions, missing claims and unrecognised roles all resolve to
    /// `Guest`.
    pub fn from_session(session: Option<&SessionData>) -> Self {
        let Some(session) = session else {
            return Principal::Guest;
        };
        let (Some(id), Some(role)) = (session.user_id(), session.role()) else {
            return Principal::Guest;
        };

        match role.parse::<Role>() {
            Ok(Role::Customer) => Principal::Customer { id },
            Ok(Role::Employee) => Principal::Employee { id },
            Ok(Role::Admin) => Principal::Admin { id },
            Err(UnknownRole(role)) => {
                debug!(role = %role, "session carries unrecognised role, treating as guest");
                Principal::Guest
            }
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Principal::Guest => None,
            Principal::Customer { .. } => Some(Role::Customer),
            Principal::Employee { .. } => Some(Role::Employee),
            Principal::Admin { .. } => Some(Role::Admin),
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        match self {
            Principal::Guest => None,
            Principal::Customer { id } | Principal::Employee { id } | Principal::Admin { id } => Some(*id),
        }
    }

    pub fn bag_owner(&self) -> Option<BagOwner> {
        match self {
            Principal::Customer { id } => Some(BagOwner::Customer(*id)),
            Principal::Employee { id } => Some(BagOwner::Employee(*id)),
            Principal::Guest | Principal::Admin { .. } => None,
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.role(), self.user_id()) {
            (Some(role), Some(id)) => write!(f, "{role}:{id}"),
            _ => f.write_str("anonymous"),
        }
    }
}

/// Whose bag a line item belongs to: a customer's cart or an employee's
/// point-of-sale tab. Same numeric id under different tags are different
/// bags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum BagOwner {
    Customer(i64),
    Employee(i64),
}

impl BagOwner {
    pub fn customer_id(&self) -> Option<i64> {
        match self {
            BagOwner::Customer(id) => Some(*id),
            BagOwner::Employee(_) => None,
        }
    }

    pub fn employee_id(&self) -> Option<i64> {
        match self {
            BagOwner::Employee(id) => Some(*id),
            BagOwner::Customer(_) => None,
        }
    }
}

impl fmt::Display for BagOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BagOwner::Customer(id) => write!(f, "customer:{id}"),
            BagOwner::Employee(id) => write!(f, "employee:{id}"),
        }
    }
}

async fn resolve_principal(req: &Request<'_>) -> Principal {
    let Some(sessions) = req.rocket().state::<SessionManager>() else {
        error!("session manager is not managed, every request resolves as guest");
        return Principal::Guest;
    };

    let session = sessions.current(req.cookies()).await;
    Principal::from_session(session.as_ref())
}

/// Resolves the principal once per request; later guards reuse it.
async fn principal_for(req: &Request<'_>) -> Principal {
    let principal = *req.local_cache_async(resolve_principal(req)).await;
    req.local_cache(|| Some(principal));
    principal
}

/// The principal if some guard already resolved it, for logging.
pub(crate) fn cached_principal(req: &Request<'_>) -> Option<Principal> {
    *req.local_cache(|| None::<Principal>)
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Principal {
    type Error = Infallible;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        Outcome::Success(principal_for(req).await)
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for BagOwner {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        match principal_for(req).await.bag_owner() {
            Some(owner) => Outcome::Success(owner),
            None => Outcome::Error((Status::Unauthorized, AppError::Unauthenticated)),
        }
    }
}

pub trait RequiredRole: Send + Sync + 'static {
    const ROLE: Role;
}

pub struct AdminOnly;
pub struct EmployeeOnly;
pub struct CustomerOnly;

impl RequiredRole for AdminOnly {
    const ROLE: Role = Role::Admin;
}

impl RequiredRole for EmployeeOnly {
    const ROLE: Role = Role::Employee;
}

impl RequiredRole for CustomerOnly {
    const ROLE: Role = Role::Customer;
}

/// Request guard that admits only principals holding `R::ROLE`.
///
/// Both failures surface as 401; the catcher registered for the route's base
/// path decides between a login redirect and a JSON error.
pub struct Authorized<R: RequiredRole> {
    pub user_id: i64,
    _role: PhantomData<R>,
}

impl<R: RequiredRole> Authorized<R> {
    pub(crate) fn check(principal: &Principal) -> Result<Self, AppError> {
        match (principal.role(), principal.user_id()) {
            (Some(role), Some(user_id)) if role == R::ROLE => Ok(Self {
                user_id,
                _role: PhantomData,
            }),
            (Some(_), _) => Err(AppError::Forbidden),
            _ => Err(AppError::Unauthenticated),
        }
    }
}

#[rocket::async_trait]
impl<'r, R: RequiredRole> FromRequest<'r> for Authorized<R> {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        let principal = principal_for(req).await;
        match Self::check(&principal) {
            Ok(authorized) => Outcome::Success(authorized),
            Err(err) => {
                debug!(
                    principal = %principal,
                    required = %R::ROLE,
                    uri = %req.uri(),
                    "role gate rejected request"
                );
                Outcome::Error((Status::Unauthorized, err))
            }
        }
    }
}

pub type AdminSession = Authorized<AdminOnly>;
pub type EmployeeSession = Authorized<EmployeeOnly>;
pub type CustomerSession = Authorized<CustomerOnly>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ROLE_CLAIM, USER_ID_CLAIM};

    #[test]
    fn missing_session_is_guest() {
        assert_eq!(Principal::from_session(None), Principal::Guest);
    }

    #[test]
    fn known_roles_map_to_principals() {
        let customer = SessionData::for_user(42, Role::Customer);
        let employee = SessionData::for_user(42, Role::Employee);
        let admin = SessionData::for_user(1, Role::Admin);

        assert_eq!(Principal::from_session(Some(&customer)), Principal::Customer { id: 42 });
        assert_eq!(Principal::from_session(Some(&employee)), Principal::Employee { id: 42 });
        assert_eq!(Principal::from_session(Some(&admin)), Principal::Admin { id: 1 });
    }

    #[test]
    fn unrecognised_role_fails_closed() {
        let session = SessionData::new().with(USER_ID_CLAIM, 9).with(ROLE_CLAIM, "superuser");
        assert_eq!(Principal::from_session(Some(&session)), Principal::Guest);
    }

    #[test]
    fn missing_claims_fail_closed() {
        let no_role = SessionData::new().with(USER_ID_CLAIM, 9);
        let no_id = SessionData::new().with(ROLE_CLAIM, "customer");
        assert_eq!(Principal::from_session(Some(&no_role)), Principal::Guest);
        assert_eq!(Principal::from_session(Some(&no_id)), Principal::Guest);
    }

    #[test]
    fn bag_owner_is_exclusive_per_role() {
        assert_eq!(Principal::Customer { id: 3 }.bag_owner(), Some(BagOwner::Customer(3)));
        assert_eq!(Principal::Employee { id: 3 }.bag_owner(), Some(BagOwner::Employee(3)));
        assert_eq!(Principal::Admin { id: 3 }.bag_owner(), None);
        assert_eq!(Principal::Guest.bag_owner(), None);

        let owner = BagOwner::Customer(3);
        assert_eq!((owner.customer_id(), owner.employee_id()), (Some(3), None));
        let owner = BagOwner::Employee(3);
        assert_eq!((owner.customer_id(), owner.employee_id()), (None, Some(3)));
    }

    #[test]
    fn role_gate_distinguishes_guest_from_wrong_role() {
        assert!(AdminSession::check(&Principal::Admin { id: 1 }).is_ok());
        assert!(matches!(AdminSession::check(&Principal::Customer { id: 1 }), Err(AppError::Forbidden)));
        assert!(matches!(AdminSession::check(&Principal::Guest), Err(AppError::Unauthenticated)));
        assert_eq!(CustomerSession::check(&Principal::Customer { id: 8 }).map(|s| s.user_id).ok(), Some(8));
    }

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::Admin, Role::Employee, Role::Customer] {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert_eq!("root".parse::<Role>(), Err(UnknownRole("root".to_string())));
    }
}
