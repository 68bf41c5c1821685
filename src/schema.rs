//! Well-known directory attributes
//!
//! The analysis passes refer to a fixed set of directory attributes by
//! handle. [`DirectorySchema::register`] interns them into a registry at
//! startup and hands back a struct of handles, so nothing depends on global
//! state and tests can build as many independent schemas as they like.
//!
//! Names starting with `_` are meta attributes synthesized by analysis.

use crate::attribute::{Attribute, AttributeRegistry};

macro_rules! directory_schema {
    ($($(#[$doc:meta])* $field:ident => $name:literal,)*) => {
        /// Handles of the well-known directory attributes
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct DirectorySchema {
            $($(#[$doc])* pub $field: Attribute,)*
        }

        impl DirectorySchema {
            /// Names interned by [`DirectorySchema::register`], in order
            pub const NAMES: &'static [&'static str] = &[$($name),*];

            /// Intern every well-known attribute into `registry`
            pub fn register(registry: &AttributeRegistry) -> Self {
                let schema = Self {
                    $($field: registry.intern($name),)*
                };
                // Seen on nearly every object; interned early to keep handles low
                for extra in PRESEEDED {
                    registry.intern(extra);
                }
                schema
            }
        }
    };
}

/// Frequently seen attributes without a dedicated field
const PRESEEDED: &[&str] = &["member", "proxyAddresses", "dSCorePropagationData"];

directory_schema! {
    distinguished_name => "distinguishedName",
    object_class => "objectClass",
    object_category => "objectCategory",
    object_category_simple => "objectCategorySimple",
    structural_object_class => "structuralObjectClass",
    nt_security_descriptor => "nTSecurityDescriptor",
    sam_account_type => "sAMAccountType",
    group_type => "groupType",
    member_of => "memberOf",
    account_expires => "accountExpires",
    reps_to => "repsTo",
    instance_type => "instanceType",
    modified_count => "modifiedCount",
    min_pwd_age => "minPwdAge",
    min_pwd_length => "minPwdLength",
    pwd_properties => "pwdProperties",
    lockout_duration => "lockoutDuration",
    pwd_history_length => "pwdHistoryLength",
    is_critical_system_object => "isCriticalSystemObject",
    fsmo_role_owner => "fSMORoleOwner",
    nt_mixed_domain => "nTMixedDomain",
    system_flags => "systemFlags",
    primary_group_id => "primaryGroupID",
    logon_count => "logonCount",
    logon_hours => "logonHours",
    code_page => "codePage",
    country_code => "countryCode",
    /// Account-control bitmask, see [`crate::activedirectory::uac_flags`]
    user_account_control => "userAccountControl",
    local_policy_flags => "localPolicyFlags",
    operating_system => "operatingSystem",
    operating_system_version => "operatingSystemVersion",
    operating_system_hotfix => "operatingSystemHotfix",
    operating_system_service_pack => "operatingSystemServicePack",
    admin_count => "adminCount",
    bad_pwd_count => "badPwdCount",
    gpc_file_sys_path => "gPCFileSysPath",
    schema_id_guid => "schemaIDGUID",
    poss_superiors => "possSuperiors",
    system_may_contain => "systemMayContain",
    system_must_contain => "systemMustContain",
    service_principal_name => "servicePrincipalName",
    name => "name",
    display_name => "displayName",
    ldap_display_name => "lDAPDisplayName",
    description => "description",
    sam_account_name => "sAMAccountName",
    object_sid => "objectSid",
    object_guid => "objectGUID",
    pwd_last_set => "pwdLastSet",
    when_created => "whenCreated",
    when_changed => "whenChanged",
    sid_history => "sIDHistory",
    last_logon => "lastLogon",
    last_logon_timestamp => "lastLogonTimestamp",
    ms_ds_group_msa_membership => "msDS-GroupMSAMembership",
    ms_ds_host_service_account => "msDS-HostServiceAccount",
    ms_ds_host_service_account_bl => "msDS-HostServiceAccountBL",
    /// LAPS password expiry
    ms_mcs_adm_pwd_expiration_time => "ms-mcs-AdmPwdExpirationTime",
    security_identifier => "securityIdentifier",
    trust_direction => "trustDirection",
    trust_attributes => "trustAttributes",
    trust_partner => "trustPartner",
    ds_heuristics => "dsHeuristics",
    attribute_security_guid => "attributeSecurityGUID",
    rights_guid => "rightsGUID",
    gp_link => "gPLink",
    gp_options => "gPOptions",
    script_path => "scriptPath",
    ms_pki_certificate_name_flag => "msPKI-Certificate-Name-Flag",
    pki_extended_key_usage => "pKIExtendedKeyUsage",
    /// Cached class GUIDs used when mapping security descriptors
    object_class_guid => "objectClassGUID",
    object_category_guid => "objectCategoryGUID",
    data_source => "_datasource",
    down_level_logon_name => "DownLevelLogonName",
    netbios_domain => "netbiosDomain",
    protected_user => "_protecteduser",
    unconstrained_delegation => "_unconstraineddelegation",
    constrained_delegation => "_constraineddelegation",
    has_spn => "_hasspn",
    password_age => "_passwordage",
    last_login_age => "_lastloginage",
    account_disabled => "_accountdisabled",
    password_cant_change => "_passwordcantchange",
    password_not_required => "_passwordnotrequired",
    password_no_expire => "_passwordnoexpire",
    linux => "_linux",
    windows => "_windows",
    workstation => "_workstation",
    server => "_server",
    laps_installed => "_haslaps",
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_interns_all_names() {
        let registry = AttributeRegistry::new();
        let schema = DirectorySchema::register(&registry);

        assert_eq!(registry.len(), DirectorySchema::NAMES.len() + PRESEEDED.len());
        assert_eq!(registry.lookup("USERACCOUNTCONTROL"), schema.user_account_control);
        assert_eq!(registry.display(schema.object_sid), "objectSid");
        assert_eq!(registry.lookup("possSuperiors"), schema.poss_superiors);
        assert_eq!(registry.display(schema.object_category_guid), "objectCategoryGUID");
    }

    #[test]
    fn test_meta_attributes() {
        let registry = AttributeRegistry::new();
        let schema = DirectorySchema::register(&registry);

        assert!(registry.is_meta(schema.account_disabled));
        assert!(registry.is_meta(schema.laps_installed));
        assert!(!registry.is_meta(schema.description));
        assert!(!registry.is_meta(schema.down_level_logon_name));
    }

    #[test]
    fn test_register_twice_is_stable() {
        let registry = AttributeRegistry::new();
        let first = DirectorySchema::register(&registry);
        let second = DirectorySchema::register(&registry);

        assert_eq!(first, second);
        assert_eq!(registry.popularity(first.name), 2);
    }

    #[test]
    fn test_names_are_unique_case_insensitively() {
        let mut folded: Vec<String> = DirectorySchema::NAMES
            .iter()
            .map(|n| n.to_lowercase())
            .collect();
        folded.sort();
        let before = folded.len();
        folded.dedup();
        assert_eq!(folded.len(), before);
    }
}
