use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// User role with a total privilege order: Sales < Admin < SuperAdmin.
///
/// The derived `Ord` is the privilege order; every privilege comparison in
/// the system goes through this enum rather than ad hoc level tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Sales,
    Admin,
    SuperAdmin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Sales, Role::Admin, Role::SuperAdmin];

    /// Integer rank used in API payloads and log lines.
    pub fn privilege_level(self) -> u8 {
        match self {
            Role::Sales => 1,
            Role::Admin => 2,
            Role::SuperAdmin => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Sales => "sales",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sales" => Ok(Role::Sales),
            "admin" => Ok(Role::Admin),
            "super_admin" => Ok(Role::SuperAdmin),
            _ => Err(()),
        }
    }
}

/// The authenticated identity performing a management request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i64,
    pub role: Role,
}

/// The entity a management operation acts upon.
///
/// Create operations carry the proposed role; update/delete carry the
/// resolved target user, or `Missing` when resolution failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Proposed(Role),
    Existing { user_id: i64, role: Role },
    Missing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Create,
    Update,
    Delete,
}

/// Outcome of a permission check, with a human-readable reason.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub reason: &'static str,
}

impl Decision {
    fn allow() -> Self {
        Decision {
            allowed: true,
            reason: "allowed",
        }
    }

    fn deny(reason: &'static str) -> Self {
        Decision {
            allowed: false,
            reason,
        }
    }
}

/// Decide whether `actor` may perform `action` on `target`.
///
/// Pure function, no I/O; the single source of truth for user-management
/// authorization. Rules are evaluated strictly in order, so the most
/// specific denial reason wins. One rule lives outside this function: a
/// user may never change their own role on update, which the user
/// store's update path checks because it alone knows whether the role is
/// changing.
pub fn decide(actor: Option<Actor>, target: Target, action: Action) -> Decision {
    let actor = match actor {
        Some(actor) => actor,
        None => return Decision::deny("unauthenticated"),
    };

    if actor.role == Role::Sales {
        return Decision::deny("no management capability");
    }

    if action == Action::Create {
        let proposed = match target {
            Target::Proposed(role) => role,
            Target::Existing { role, .. } => role,
            // Role omitted on create defaults to sales.
            Target::Missing => Role::Sales,
        };
        return match actor.role {
            Role::SuperAdmin if proposed == Role::SuperAdmin => {
                Decision::deny("super-admin accounts cannot be created via the API")
            }
            Role::SuperAdmin => Decision::allow(),
            Role::Admin if proposed == Role::Sales => Decision::allow(),
            Role::Admin => Decision::deny("admin may only create sales accounts"),
            Role::Sales => unreachable!("sales rejected above"),
        };
    }

    let (target_id, target_role) = match target {
        Target::Existing { user_id, role } => (user_id, role),
        _ => return Decision::deny("target not found or incomplete"),
    };

    if action == Action::Delete && actor.user_id == target_id {
        return Decision::deny("cannot act on self");
    }

    if actor.role == Role::SuperAdmin && target_role == Role::SuperAdmin {
        return Decision::deny("super-admin peer operations forbidden via the API");
    }

    if actor.role == Role::Admin && target_role >= Role::Admin {
        return Decision::deny("admin may only act on sales");
    }

    if target_role >= actor.role {
        return Decision::deny("actor may only act on strictly lower-privileged targets");
    }

    Decision::allow()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTOR_ID: i64 = 10;
    const TARGET_ID: i64 = 20;

    fn actor(role: Role) -> Option<Actor> {
        Some(Actor {
            user_id: ACTOR_ID,
            role,
        })
    }

    fn existing(role: Role) -> Target {
        Target::Existing {
            user_id: TARGET_ID,
            role,
        }
    }

    #[test]
    fn role_order_matches_privilege_levels() {
        assert!(Role::Sales < Role::Admin);
        assert!(Role::Admin < Role::SuperAdmin);
        assert_eq!(Role::Sales.privilege_level(), 1);
        assert_eq!(Role::Admin.privilege_level(), 2);
        assert_eq!(Role::SuperAdmin.privilege_level(), 3);
    }

    #[test]
    fn role_round_trips_through_strings() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert!("owner".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn unauthenticated_is_always_denied() {
        for action in [Action::Create, Action::Update, Action::Delete] {
            for role in Role::ALL {
                let d = decide(None, existing(role), action);
                assert!(!d.allowed);
                assert_eq!(d.reason, "unauthenticated");
            }
        }
    }

    /// Full rule table: every (actor role, target role, action) triple.
    #[test]
    fn rule_table_is_exhaustive() {
        use Action::*;
        use Role::*;

        // (actor, target, action, allowed, reason)
        let cases: &[(Role, Role, Action, bool, &str)] = &[
            // sales actor: rule 1 fires before anything else
            (Sales, Sales, Create, false, "no management capability"),
            (Sales, Admin, Create, false, "no management capability"),
            (Sales, SuperAdmin, Create, false, "no management capability"),
            (Sales, Sales, Update, false, "no management capability"),
            (Sales, Admin, Update, false, "no management capability"),
            (Sales, SuperAdmin, Update, false, "no management capability"),
            (Sales, Sales, Delete, false, "no management capability"),
            (Sales, Admin, Delete, false, "no management capability"),
            (Sales, SuperAdmin, Delete, false, "no management capability"),
            // admin actor
            (Admin, Sales, Create, true, "allowed"),
            (Admin, Admin, Create, false, "admin may only create sales accounts"),
            (
                Admin,
                SuperAdmin,
                Create,
                false,
                "admin may only create sales accounts",
            ),
            (Admin, Sales, Update, true, "allowed"),
            (Admin, Admin, Update, false, "admin may only act on sales"),
            (Admin, SuperAdmin, Update, false, "admin may only act on sales"),
            (Admin, Sales, Delete, true, "allowed"),
            (Admin, Admin, Delete, false, "admin may only act on sales"),
            (Admin, SuperAdmin, Delete, false, "admin may only act on sales"),
            // super_admin actor
            (SuperAdmin, Sales, Create, true, "allowed"),
            (SuperAdmin, Admin, Create, true, "allowed"),
            (
                SuperAdmin,
                SuperAdmin,
                Create,
                false,
                "super-admin accounts cannot be created via the API",
            ),
            (SuperAdmin, Sales, Update, true, "allowed"),
            (SuperAdmin, Admin, Update, true, "allowed"),
            (
                SuperAdmin,
                SuperAdmin,
                Update,
                false,
                "super-admin peer operations forbidden via the API",
            ),
            (SuperAdmin, Sales, Delete, true, "allowed"),
            (SuperAdmin, Admin, Delete, true, "allowed"),
            (
                SuperAdmin,
                SuperAdmin,
                Delete,
                false,
                "super-admin peer operations forbidden via the API",
            ),
        ];

        for &(actor_role, target_role, action, allowed, reason) in cases {
            let target = if action == Create {
                Target::Proposed(target_role)
            } else {
                existing(target_role)
            };
            let d = decide(actor(actor_role), target, action);
            assert_eq!(
                (d.allowed, d.reason),
                (allowed, reason),
                "actor={actor_role:?} target={target_role:?} action={action:?}"
            );
        }
    }

    #[test]
    fn update_and_delete_require_a_resolved_target() {
        for action in [Action::Update, Action::Delete] {
            let d = decide(actor(Role::SuperAdmin), Target::Missing, action);
            assert!(!d.allowed);
            assert_eq!(d.reason, "target not found or incomplete");
        }
    }

    #[test]
    fn delete_of_own_account_is_denied() {
        let d = decide(
            actor(Role::SuperAdmin),
            Target::Existing {
                user_id: ACTOR_ID,
                role: Role::SuperAdmin,
            },
            Action::Delete,
        );
        assert!(!d.allowed);
        assert_eq!(d.reason, "cannot act on self");
    }

    #[test]
    fn updating_own_record_is_not_blocked_by_self_rule() {
        // The self check only applies to delete; updating your own record
        // falls through to the privilege rules (and super-super denies).
        let d = decide(
            actor(Role::Admin),
            Target::Existing {
                user_id: ACTOR_ID,
                role: Role::Admin,
            },
            Action::Update,
        );
        assert!(!d.allowed);
        assert_eq!(d.reason, "admin may only act on sales");
    }

    #[test]
    fn admin_deleting_super_admin_gets_the_specific_reason() {
        // The general privilege rule would also deny this; the specific
        // admin restriction must fire first with its own reason.
        let d = decide(actor(Role::Admin), existing(Role::SuperAdmin), Action::Delete);
        assert!(!d.allowed);
        assert_eq!(d.reason, "admin may only act on sales");
    }

    #[test]
    fn create_with_missing_role_defaults_to_sales() {
        let d = decide(actor(Role::Admin), Target::Missing, Action::Create);
        assert!(d.allowed);
    }
}
