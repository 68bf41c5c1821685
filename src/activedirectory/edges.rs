use super::uac_flags;
use crate::attribute::Attribute;
use crate::edge::{Edge, EdgeTypeRegistry};
use crate::object::GraphObject;
use crate::probability::{calculator, constant, Probability, ProbabilityCalculator};
use crate::schema::DirectorySchema;

/// Handles of every Active Directory edge kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveDirectoryEdges {
    pub acl_contains_deny: Edge,
    pub reset_password: Edge,
    pub read_password_id: Edge,
    pub owns: Edge,
    pub generic_all: Edge,
    pub write_all: Edge,
    pub write_property_all: Edge,
    pub write_extended_all: Edge,
    pub take_ownership: Edge,
    pub write_dacl: Edge,
    pub write_spn: Edge,
    pub write_validated_spn: Edge,
    pub write_allowed_to_act: Edge,
    pub add_member: Edge,
    pub add_member_group_attr: Edge,
    pub add_self_member: Edge,
    pub read_msa_password: Edge,
    pub has_msa: Edge,
    pub write_user_account_control: Edge,
    pub write_key_credential_link: Edge,
    pub write_attribute_security_guid: Edge,
    pub sid_history_equality: Edge,
    pub all_extended_rights: Edge,
    pub ds_replication_synchronize: Edge,
    pub ds_replication_get_changes: Edge,
    pub ds_replication_get_changes_all: Edge,
    pub ds_replication_get_changes_in_filtered_set: Edge,
    pub dcsync: Edge,
    pub read_laps_password: Edge,
    pub member_of_group: Edge,
    pub member_of_group_indirect: Edge,
    pub has_spn: Edge,
    pub dont_req_preauth: Edge,
    pub overwrites_acl: Edge,
    pub affected_by_gpo: Edge,
    pub part_of_gpo: Edge,
    pub local_admin_rights: Edge,
    pub local_rdp_rights: Edge,
    pub local_dcom_rights: Edge,
    pub scheduled_task_on_unc_path: Edge,
    pub machine_script: Edge,
    pub write_alt_security_identities: Edge,
    pub write_profile_path: Edge,
    pub write_script_path: Edge,
    pub certificate_enroll: Edge,
    pub certificate_auto_enroll: Edge,
    pub voodoo_bit: Edge,
}

/// Whether the target's account-control bitmask has the disable bit set
fn account_disabled(target: &dyn GraphObject, uac: Attribute) -> bool {
    target.has_flag(uac, uac_flags::ACCOUNTDISABLE)
}

/// `disabled` for disabled accounts, `enabled` otherwise
fn unless_disabled(
    uac: Attribute,
    disabled: Probability,
    enabled: Probability,
) -> ProbabilityCalculator {
    calculator(move |_, target| {
        if account_disabled(target, uac) {
            disabled
        } else {
            enabled
        }
    })
}

impl ActiveDirectoryEdges {
    /// Declare the catalog into `edges`
    ///
    /// Meant for single-threaded startup. Declaring twice into the same
    /// registry returns the same handles and resets every catalog edge to the
    /// configuration below, discarding earlier
    /// [`EdgeOverrides`](crate::config::EdgeOverrides). Apply overrides after
    /// the last call.
    pub fn register(edges: &EdgeTypeRegistry, schema: &DirectorySchema) -> Self {
        let uac = schema.user_account_control;
        let half = Probability::new(50);

        // Referenced by WriteKeyCredentialLink, so declared up front
        let write_user_account_control = edges
            .declare("WriteUserAccountControl")
            .describe(
                "Allows attacker to set ENABLE and set DONT_REQ_PREAUTH and then to AS_REP Kerberoasting",
            )
            .register_probability_calculator(constant(half))
            .build();

        let write_key_credential_link = edges
            .declare("WriteKeyCredentialLink")
            .register_probability_calculator(calculator(move |source, target| {
                if account_disabled(target, uac)
                    && !source.has_edge_to(target.id(), write_user_account_control)
                {
                    return Probability::NEVER;
                }
                Probability::CERTAIN
            }))
            .build();

        let read_password_id = edges
            .declare("ReadPasswordId")
            .set_default(false, false, false)
            .register_probability_calculator(constant(Probability::new(5)))
            .build();

        Self {
            acl_contains_deny: edges
                .declare("ACLContainsDeny")
                .register_probability_calculator(constant(Probability::INAPPLICABLE))
                .build(),
            reset_password: edges
                .declare("ResetPassword")
                .register_probability_calculator(unless_disabled(
                    uac,
                    Probability::INAPPLICABLE,
                    Probability::CERTAIN,
                ))
                .build(),
            read_password_id,
            owns: edges.declare("Owns").build(),
            generic_all: edges.declare("GenericAll").build(),
            write_all: edges.declare("WriteAll").build(),
            write_property_all: edges.declare("WritePropertyAll").build(),
            write_extended_all: edges.declare("WriteExtendedAll").build(),
            take_ownership: edges.declare("TakeOwnership").build(),
            write_dacl: edges.declare("WriteDACL").build(),
            write_spn: edges
                .declare("WriteSPN")
                .register_probability_calculator(unless_disabled(uac, Probability::NEVER, half))
                .build(),
            write_validated_spn: edges
                .declare("WriteValidatedSPN")
                .register_probability_calculator(unless_disabled(uac, Probability::NEVER, half))
                .build(),
            write_allowed_to_act: edges.declare("WriteAllowedToAct").build(),
            add_member: edges.declare("AddMember").build(),
            add_member_group_attr: edges.declare("AddMemberGroupAttr").build(),
            add_self_member: edges.declare("AddSelfMember").build(),
            read_msa_password: edges.declare("ReadMSAPassword").build(),
            has_msa: edges.declare("HasMSA").build(),
            write_user_account_control,
            write_key_credential_link,
            // Only exploitable on a patched DC
            write_attribute_security_guid: edges
                .declare("WriteAttrSecurityGUID")
                .register_probability_calculator(constant(Probability::new(5)))
                .build(),
            sid_history_equality: edges.declare("SIDHistoryEquality").build(),
            all_extended_rights: edges.declare("AllExtendedRights").build(),
            ds_replication_synchronize: edges.declare("DSReplSync").build(),
            ds_replication_get_changes: edges
                .declare("DSReplGetChngs")
                .set_default(false, false, false)
                .build(),
            ds_replication_get_changes_all: edges
                .declare("DSReplGetChngsAll")
                .set_default(false, false, false)
                .build(),
            ds_replication_get_changes_in_filtered_set: edges
                .declare("DSReplGetChngsInFiltSet")
                .set_default(false, false, false)
                .build(),
            dcsync: edges.declare("DCsync").build(),
            read_laps_password: edges.declare("ReadLAPSPassword").build(),
            member_of_group: edges.declare("MemberOfGroup").build(),
            member_of_group_indirect: edges
                .declare("MemberOfGroupIndirect")
                .set_default(false, false, false)
                .build(),
            has_spn: edges
                .declare("HasSPN")
                .describe(
                    "Kerberoastable by requesting Kerberos service ticket against SPN and then bruteforcing the ticket",
                )
                .register_probability_calculator(unless_disabled(uac, Probability::NEVER, half))
                .build(),
            dont_req_preauth: edges
                .declare("DontReqPreauth")
                .describe(
                    "Kerberoastable by AS-REP by requesting a TGT and then bruteforcing the ticket",
                )
                .register_probability_calculator(unless_disabled(uac, Probability::NEVER, half))
                .build(),
            overwrites_acl: edges.declare("OverwritesACL").build(),
            affected_by_gpo: edges.declare("AffectedByGPO").build(),
            part_of_gpo: edges.declare("PartOfGPO").build(),
            local_admin_rights: edges.declare("AdminRights").build(),
            local_rdp_rights: edges
                .declare("RDPRights")
                .register_probability_calculator(constant(Probability::new(30)))
                .build(),
            local_dcom_rights: edges
                .declare("DCOMRights")
                .register_probability_calculator(constant(half))
                .build(),
            scheduled_task_on_unc_path: edges.declare("SchedTaskOnUNCPath").build(),
            machine_script: edges.declare("MachineScript").build(),
            write_alt_security_identities: edges.declare("WriteAltSecIdent").build(),
            write_profile_path: edges.declare("WriteProfilePath").build(),
            write_script_path: edges.declare("WriteScriptPath").build(),
            certificate_enroll: edges.declare("CertificateEnroll").build(),
            certificate_auto_enroll: edges.declare("CertificateAutoEnroll").build(),
            voodoo_bit: edges.declare("VoodooBit").build(),
        }
    }

    /// Edge kinds whose calculators react to the account-disable bit
    pub fn disable_sensitive(&self) -> [Edge; 6] {
        [
            self.reset_password,
            self.write_spn,
            self.write_validated_spn,
            self.write_key_credential_link,
            self.has_spn,
            self.dont_req_preauth,
        ]
    }
}
