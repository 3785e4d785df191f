//! Prompt construction for NL → GraphQL translation.
//!
//! The schema description and the user text are embedded verbatim, never
//! truncated.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::identity::{IdentityContext, Role};

/// The word the model must answer with when nothing in the schema fits.
/// Compared case-insensitively by the extractor side of the pipeline.
pub const REJECTION_SENTINEL: &str = "INVALID";

/// How much the prompt knows about the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptPolicy {
    /// No identity awareness; every operation is advertised to everyone.
    #[default]
    Public,
    /// Injects the caller's role and the operations that role may use.
    RoleAware,
}

impl fmt::Display for PromptPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptPolicy::Public => f.write_str("public"),
            PromptPolicy::RoleAware => f.write_str("role_aware"),
        }
    }
}

impl FromStr for PromptPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "public" => Ok(PromptPolicy::Public),
            "role_aware" => Ok(PromptPolicy::RoleAware),
            other => Err(format!("unknown prompt policy '{other}'")),
        }
    }
}

const PREAMBLE: &str = "You are a GraphQL assistant for a job portal. \
    Your job is to translate the user's request into a valid GraphQL operation based on the schema. \
    Return ONLY the GraphQL operation code with no explanations.";

/// Role-blind operation catalogue.
const PUBLIC_INSTRUCTIONS: &str = "\
**KEY INSTRUCTIONS:**
1. Most queries are public - freely use:
   - `users` and `userById` for user searches
   - `jobs` and `jobById` for job searches
   - `matchingCandidates` for candidate matching
   - `analyticsJobsCount` for job counts

2. Auth-required operations - use these if the request implies it's the logged-in user acting:
   - `updateMyProfile` for profile updates like 'update my skills'
   - `apply` for job applications like 'apply to job X'
   - `recommendedJobs` for personalized recommendations

3. Admin operations - use if explicitly requested:
   - `createJob` for creating jobs
   - `updateJob`/`deleteJob` for managing jobs
   - `updateUser`/`deleteUser` for managing other users";

const ANONYMOUS_GUIDANCE: &str = "\
The caller is not logged in. Only public read operations are permitted:
   - `jobs`, `jobById`, `analyticsJobsCount`
   - `userById`, `applications`, `applicationById`
Example: \"how many jobs are in Seattle\" -> query { analyticsJobsCount(location: \"Seattle, WA\") }";

const USER_GUIDANCE: &str = "\
The caller is a job seeker. Permitted: all public reads plus
   - `updateMyProfile` (only their own profile)
     Example: \"add Rust to my skills\" -> mutation { updateMyProfile(input: { skills: [\"Rust\"] }) { UserID skills } }
   - `apply`
     Example: \"apply to the Python Backend Developer job at DataCorp as Charlie Brown\" -> mutation { apply(userName: \"Charlie Brown\", jobTitle: \"Python Backend Developer\", companyName: \"DataCorp\") { appId status } }
   - `recommendedJobs`
     Example: \"which jobs fit my skills\" -> query { recommendedJobs(skillMatchThreshold: 50) { jobId title company } }
Not permitted: `users`, `matchingCandidates`, `createJob`, `updateJob`, `deleteJob`, `updateUser`, `deleteUser`.";

const RECRUITER_GUIDANCE: &str = "\
The caller is a recruiter. Permitted: all public reads plus
   - `users`
     Example: \"list candidates named Alice\" -> query { users(FirstName: \"Alice\") { UserID FirstName LastName skills } }
   - `matchingCandidates`
     Example: \"who fits job 3\" -> query { matchingCandidates(jobId: 3, skillMatchThreshold: 50) { UserID FirstName LastName } }
   - `createJob`, `updateJob`, `deleteJob`
     Example: \"post a Rust Engineer job at Acme in Remote\" -> mutation { createJob(input: { title: \"Rust Engineer\", company: \"Acme\", location: \"Remote\" }) { jobId title } }
Not permitted: `updateMyProfile`, `apply`, `recommendedJobs`, `updateUser`, `deleteUser`.";

const ADMIN_GUIDANCE: &str = "\
The caller is an administrator. Every operation in the schema is permitted, including
   - `updateUser`
     Example: \"set user 4's title to Staff Engineer\" -> mutation { updateUser(UserID: 4, input: { ProfessionalTitle: \"Staff Engineer\" }) { UserID ProfessionalTitle } }
   - `deleteUser`
     Example: \"remove user 9\" -> mutation { deleteUser(UserID: 9) }";

fn rejection_rule() -> String {
    format!("If the request cannot be mapped to the schema, return the word: {REJECTION_SENTINEL}")
}

fn role_guidance(identity: Option<&IdentityContext>) -> &'static str {
    match identity.map(|i| i.role) {
        None => ANONYMOUS_GUIDANCE,
        Some(Role::User) => USER_GUIDANCE,
        Some(Role::Recruiter) => RECRUITER_GUIDANCE,
        Some(Role::Admin) => ADMIN_GUIDANCE,
    }
}

/// Builds the instruction text sent to the model.
///
/// `identity` is ignored under `PromptPolicy::Public`.
pub fn build_prompt(
    user_text: &str,
    schema_sdl: &str,
    policy: PromptPolicy,
    identity: Option<&IdentityContext>,
) -> String {
    let rules = match policy {
        PromptPolicy::Public => format!("{PUBLIC_INSTRUCTIONS}\n\n4. {}", rejection_rule()),
        PromptPolicy::RoleAware => {
            let role = identity.map(|i| i.role.as_str()).unwrap_or("anonymous");
            format!(
                "**CALLER ROLE:** {role}\n\n{}\n\n{}\n\
                 If the caller's role cannot perform the mapped action, return the word: {REJECTION_SENTINEL}",
                role_guidance(identity),
                rejection_rule(),
            )
        }
    };

    format!("{PREAMBLE}\n\n{rules}\n\nSchema:\n{schema_sdl}\n\nUser request:\n{user_text}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = "type Query { jobs(location: String): [Job] }";

    fn identity(role: Role) -> IdentityContext {
        IdentityContext { subject: 1, role }
    }

    #[test]
    fn test_public_prompt_embeds_schema_and_request_verbatim() {
        let prompt = build_prompt("list all jobs in Austin", SCHEMA, PromptPolicy::Public, None);
        assert!(prompt.contains(SCHEMA));
        assert!(prompt.ends_with("User request:\nlist all jobs in Austin"));
        assert!(prompt.contains("return the word: INVALID"));
    }

    #[test]
    fn test_public_prompt_ignores_identity() {
        let anonymous = build_prompt("x", SCHEMA, PromptPolicy::Public, None);
        let admin = build_prompt("x", SCHEMA, PromptPolicy::Public, Some(&identity(Role::Admin)));
        assert_eq!(anonymous, admin);
        assert!(!admin.contains("CALLER ROLE"));
    }

    #[test]
    fn test_large_schema_is_not_truncated() {
        let schema = "type Job { title: String }\n".repeat(5_000);
        let prompt = build_prompt("jobs", &schema, PromptPolicy::Public, None);
        assert!(prompt.contains(&schema));
    }

    #[test]
    fn test_role_aware_prompt_names_role_and_guidance() {
        let prompt = build_prompt(
            "who fits job 3",
            SCHEMA,
            PromptPolicy::RoleAware,
            Some(&identity(Role::Recruiter)),
        );
        assert!(prompt.contains("**CALLER ROLE:** recruiter"));
        assert!(prompt.contains("matchingCandidates(jobId: 3"));
        assert!(prompt.contains("If the caller's role cannot perform the mapped action"));
        assert!(prompt.contains(SCHEMA));
    }

    #[test]
    fn test_role_aware_prompt_without_identity_is_anonymous() {
        let prompt = build_prompt("jobs", SCHEMA, PromptPolicy::RoleAware, None);
        assert!(prompt.contains("**CALLER ROLE:** anonymous"));
        assert!(prompt.contains("not logged in"));
    }

    #[test]
    fn test_every_role_gets_a_worked_example() {
        for role in [Role::User, Role::Recruiter, Role::Admin] {
            let prompt = build_prompt("x", SCHEMA, PromptPolicy::RoleAware, Some(&identity(role)));
            assert!(prompt.contains("Example:"), "no example for {role}");
            assert!(prompt.contains(REJECTION_SENTINEL));
        }
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("public".parse::<PromptPolicy>().unwrap(), PromptPolicy::Public);
        assert_eq!("Role-Aware".parse::<PromptPolicy>().unwrap(), PromptPolicy::RoleAware);
        assert_eq!("role_aware".parse::<PromptPolicy>().unwrap(), PromptPolicy::RoleAware);
        assert!("strict".parse::<PromptPolicy>().is_err());
    }
}
