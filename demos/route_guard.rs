//! Walks the route guard through the navigation states a protected portal sees:
//! loading, logged out, wrong role, and admitted.

// crates.io
use color_eyre::Result;
// self
use session_guard::{
	auth::{Principal, Role, UserId},
	guard::{GuardDecision, RouteGuard, RouteRequirement},
	session::SessionSnapshot,
};

fn describe(label: &str, decision: &GuardDecision) {
	match decision {
		GuardDecision::Pending => println!("{label}: pending, show a waiting indicator"),
		GuardDecision::Admitted => println!("{label}: admitted, render the subtree"),
		GuardDecision::Denied(denial) => println!(
			"{label}: denied ({:?}), redirect to {} (return to {:?})",
			denial.reason, denial.redirect_to, denial.return_to
		),
	}
}

fn main() -> Result<()> {
	color_eyre::install()?;

	let guard = RouteGuard::new();
	let requirement = RouteRequirement::any_of([Role::Lawyer, Role::Admin]);
	let loading = SessionSnapshot { loading: true, principal: None, last_error: None };

	describe("while hydrating", &guard.evaluate(&loading, &requirement, "/cases"));

	let logged_out = SessionSnapshot::default();

	describe("logged out", &guard.evaluate(&logged_out, &requirement, "/cases"));

	let secretary = Principal::builder(UserId::new("42")?, Role::Secretary)
		.username("mross")
		.display_name("Monica Ross")
		.email("mross@example.com")
		.token("demo-jwt")
		.build()?;
	let wrong_role = SessionSnapshot {
		loading: false,
		principal: Some(secretary),
		last_error: None,
	};

	describe("as secretary", &guard.evaluate(&wrong_role, &requirement, "/cases"));

	let lawyer = Principal::builder(UserId::new("17")?, Role::Lawyer)
		.username("jdoe")
		.display_name("John Doe")
		.email("jdoe@example.com")
		.token("demo-jwt")
		.build()?;
	let admitted = SessionSnapshot { loading: false, principal: Some(lawyer), last_error: None };

	describe("as lawyer", &guard.evaluate(&admitted, &requirement, "/cases"));

	Ok(())
}
