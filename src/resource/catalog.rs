//! Descriptors for every entity the console manages.

use crate::config::config;
use crate::resource::descriptor::{
    AttachmentPolicy, AttachmentSpec, EntityDescriptor, FieldFormat, FieldSpec, StatusEncoding,
};

fn image_policy() -> Option<AttachmentPolicy> {
    Some(AttachmentPolicy::from_config(&config().upload))
}

fn stored_file(upload_field: &'static str, stored_field: &'static str) -> AttachmentSpec {
    AttachmentSpec {
        upload_field,
        stored_field,
        existing_field: None,
        policy: image_policy(),
    }
}

pub fn home_content() -> EntityDescriptor {
    EntityDescriptor::new("home_content", "home_contents", "home_content.php")
        .route("/home")
        .field(FieldSpec::required("header_name"))
        .field(FieldSpec::required("description"))
        .attachment(AttachmentSpec {
            existing_field: Some("existing_file"),
            ..stored_file("file", "file_path")
        })
}

pub fn sections() -> EntityDescriptor {
    EntityDescriptor::new("section", "sections", "about_content.php")
        .route("/about")
        .field(FieldSpec::required("section_key"))
        .field(FieldSpec::required("header_name"))
        .field(FieldSpec::required("description"))
        .attachment(AttachmentSpec {
            existing_field: Some("existing_file"),
            ..stored_file("file", "file_path")
        })
}

/// Items belonging to an about-page section; reads are scoped by section
pub fn items() -> EntityDescriptor {
    EntityDescriptor::new("item", "items", "about_items.php")
        .field(FieldSpec::required("section_id"))
        .field(FieldSpec::required("icon"))
        .field(FieldSpec::required("subtitle"))
        .field(FieldSpec::required("description"))
        .status(StatusEncoding::Numeric)
        .json_body()
        .scoped_by("section_id")
}

pub fn employees() -> EntityDescriptor {
    EntityDescriptor::new("employee", "employees", "employee.php")
        .route("/employees")
        .field(FieldSpec::required("name"))
        .field(FieldSpec::required("gender").choices(&["Male", "Female", "Other"], "Other"))
        .field(FieldSpec::required("dob"))
        .field(FieldSpec::required("designation"))
        .field(FieldSpec::required("department"))
        .field(FieldSpec::required("joining_date"))
        .field(FieldSpec::required("email").format(FieldFormat::Email))
        .field(FieldSpec::required("phone"))
        .field(FieldSpec::optional("location"))
        .field(FieldSpec::optional("manager"))
        .attachment(stored_file("profile_image", "profile_image"))
}

pub fn products() -> EntityDescriptor {
    EntityDescriptor::new("product", "products", "product_content.php")
        .route("/products")
        .field(FieldSpec::required("header_name"))
        .field(FieldSpec::required("description"))
        .field(FieldSpec::optional("icon"))
        .status(StatusEncoding::Numeric)
        .json_body()
}

pub fn services() -> EntityDescriptor {
    EntityDescriptor::new("service", "services", "services_content.php")
        .route("/services")
        .field(FieldSpec::required("header_name"))
        .field(FieldSpec::required("description"))
        .field(FieldSpec::optional("icon"))
        .status(StatusEncoding::Numeric)
        .json_body()
}

pub fn team_members() -> EntityDescriptor {
    EntityDescriptor::new("team_member", "team_members", "our_team.php")
        .route("/ourteam")
        .field(FieldSpec::required("name"))
        .field(FieldSpec::required("designation"))
        .field(FieldSpec::optional("social_links").json())
        .attachment(stored_file("profile_image", "profile_image"))
}

pub fn testimonials() -> EntityDescriptor {
    EntityDescriptor::new("testimonial", "testimonials", "testimonial.php")
        .route("/testimonials")
        .field(FieldSpec::required("name"))
        .field(FieldSpec::optional("profession"))
        .field(FieldSpec::required("message"))
        .attachment(stored_file("image", "image"))
}

pub fn users() -> EntityDescriptor {
    EntityDescriptor::new("user", "users", "users.php")
        .route("/users")
        .field(FieldSpec::required("username"))
        .field(FieldSpec::required("first_name"))
        .field(FieldSpec::required("last_name"))
        .field(FieldSpec::required("email").format(FieldFormat::Email).locked_on_edit())
        .field(FieldSpec::on_create("password"))
        .field(FieldSpec::required("role_id"))
        .field(FieldSpec::optional("is_email_verified"))
        .status(StatusEncoding::Numeric)
        .json_body()
}

pub fn blogs() -> EntityDescriptor {
    EntityDescriptor::new("blog", "blogs", "blogs.php")
        .route("/blogs")
        .field(FieldSpec::required("header_name"))
        .field(FieldSpec::required("category_id"))
        .field(FieldSpec::optional("short_description"))
        .field(FieldSpec::required("description"))
        .attachment(stored_file("file", "file_path"))
}

pub fn courses() -> EntityDescriptor {
    EntityDescriptor::new("course", "courses", "course.php")
        .route("/courses")
        .field(FieldSpec::required("header_name"))
        .field(FieldSpec::optional("short_description"))
        .field(FieldSpec::required("description"))
        .field(FieldSpec::required("course_duration"))
        .field(FieldSpec::required("course_level"))
        .field(FieldSpec::required("course_instructor"))
        .field(FieldSpec::required("max_students").format(FieldFormat::PositiveInteger))
        // course material may be any document type
        .attachment(AttachmentSpec {
            policy: None,
            ..stored_file("file", "file_path")
        })
}

/// Read-only registrations; status is a toggled 1/0 flag
pub fn students() -> EntityDescriptor {
    EntityDescriptor::new("student", "students", "students.php")
        .route("/students")
        .status(StatusEncoding::Numeric)
        .attachment(AttachmentSpec {
            policy: None,
            ..stored_file("profile_image", "profile_image")
        })
}

/// Contact requests; status is a workflow label (`new`, `in_progress`,
/// `resolved`), not a boolean
pub fn contacts() -> EntityDescriptor {
    EntityDescriptor::new("contact", "contacts", "contact_us.php")
        .route("/contactus")
        .without_status()
}

pub const CONTACT_STATUSES: &[&str] = &["new", "in_progress", "resolved"];

pub fn all() -> Vec<EntityDescriptor> {
    vec![
        home_content(),
        sections(),
        items(),
        employees(),
        products(),
        services(),
        team_members(),
        testimonials(),
        users(),
        blogs(),
        courses(),
        students(),
        contacts(),
    ]
}

/// Look up a descriptor by singular name, plural name or endpoint
pub fn find(name: &str) -> Option<EntityDescriptor> {
    let name = name.trim().to_ascii_lowercase();
    all()
        .into_iter()
        .find(|d| d.name == name || d.plural == name || d.endpoint == name)
}

/// Descriptor whose screen lives at `route`
pub fn for_route(route: &str) -> Option<EntityDescriptor> {
    all().into_iter().find(|d| d.route == Some(route))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_and_endpoints_are_unique() {
        let all = all();
        let names: HashSet<_> = all.iter().map(|d| d.name).collect();
        let endpoints: HashSet<_> = all.iter().map(|d| d.endpoint).collect();
        assert_eq!(names.len(), all.len());
        assert_eq!(endpoints.len(), all.len());
    }

    #[test]
    fn find_accepts_plural_and_endpoint() {
        assert_eq!(find("employees").unwrap().name, "employee");
        assert_eq!(find("about_items.php").unwrap().name, "item");
        assert_eq!(find("Team_Member").unwrap().endpoint, "our_team.php");
        assert!(find("invoices").is_none());
    }

    #[test]
    fn scoped_and_route_lookups() {
        assert_eq!(items().scope_param, Some("section_id"));
        assert!(items().route.is_none());
        assert_eq!(for_route("/about").unwrap().name, "section");
    }
}
