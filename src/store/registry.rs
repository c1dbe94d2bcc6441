/// Role registry
///
/// Maps each role to the store that holds its principals. The mapping is an
/// exhaustive `match`, so a new role will not compile until it has a store.

use std::sync::Arc;

use super::{InMemoryPrincipalStore, PrincipalStore};
use crate::principal::Role;

#[derive(Clone)]
pub struct RoleRegistry {
    students: Arc<dyn PrincipalStore>,
    instructors: Arc<dyn PrincipalStore>,
}

impl RoleRegistry {
    pub fn new(students: Arc<dyn PrincipalStore>, instructors: Arc<dyn PrincipalStore>) -> Self {
        Self {
            students,
            instructors,
        }
    }

    /// Registry backed by empty in-memory collections
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryPrincipalStore::new(Role::Student)),
            Arc::new(InMemoryPrincipalStore::new(Role::Instructor)),
        )
    }

    pub fn resolve(&self, role: Role) -> &dyn PrincipalStore {
        match role {
            Role::Student => self.students.as_ref(),
            Role::Instructor => self.instructors.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principal::{Account, Instructor, Student};

    #[tokio::test]
    async fn test_roles_resolve_to_separate_collections() {
        let registry = RoleRegistry::in_memory();
        let student = Student {
            account: Account::new("42", "sam@example.com", "Sam", "Student"),
            enrolled_courses: vec![],
        };
        let instructor = Instructor {
            account: Account::new("42", "ida@example.com", "Ida", "Instructor"),
            bio: None,
            expertise: vec![],
        };

        registry.resolve(Role::Student).insert(student.into()).await.unwrap();
        registry.resolve(Role::Instructor).insert(instructor.into()).await.unwrap();

        let s = registry.resolve(Role::Student).find_by_id("42").await.unwrap().unwrap();
        let i = registry.resolve(Role::Instructor).find_by_id("42").await.unwrap().unwrap();

        assert_eq!(s.role(), Role::Student);
        assert_eq!(i.role(), Role::Instructor);
        assert_eq!(i.account().email, "ida@example.com");
    }
}
