//! Version-agnostic access to `VersionedMessage`
//!
//! Legacy and V0 messages expose headers, keys and instructions through
//! different fields. The helpers here give one API over both, plus key
//! resolution for V0 messages whose lookup-table addresses were reported in
//! execution metadata.

use solana_sdk::{
    instruction::CompiledInstruction,
    message::{MessageHeader, VersionedMessage},
    pubkey::Pubkey,
};

pub fn get_message_header(message: &VersionedMessage) -> &MessageHeader {
    match message {
        VersionedMessage::Legacy(legacy_msg) => &legacy_msg.header,
        VersionedMessage::V0(v0_msg) => &v0_msg.header,
    }
}

/// Account keys embedded in the message (no lookup-table addresses).
pub fn get_static_account_keys(message: &VersionedMessage) -> &[Pubkey] {
    match message {
        VersionedMessage::Legacy(legacy_msg) => &legacy_msg.account_keys,
        VersionedMessage::V0(v0_msg) => &v0_msg.account_keys,
    }
}

/// The first `num_required_signatures` static keys.
pub fn get_required_signers(message: &VersionedMessage) -> &[Pubkey] {
    let header = get_message_header(message);
    let account_keys = get_static_account_keys(message);
    let num_signers = header.num_required_signatures as usize;

    &account_keys[..num_signers.min(account_keys.len())]
}

/// Top-level compiled instructions.
pub fn get_instructions(message: &VersionedMessage) -> &[CompiledInstruction] {
    match message {
        VersionedMessage::Legacy(legacy_msg) => &legacy_msg.instructions,
        VersionedMessage::V0(v0_msg) => &v0_msg.instructions,
    }
}

/// Full account key list as the runtime indexes it:
/// static keys, then loaded writable, then loaded readonly addresses.
pub fn resolve_account_keys(
    message: &VersionedMessage,
    loaded_writable: &[Pubkey],
    loaded_readonly: &[Pubkey],
) -> Vec<Pubkey> {
    let static_keys = get_static_account_keys(message);
    let mut keys =
        Vec::with_capacity(static_keys.len() + loaded_writable.len() + loaded_readonly.len());
    keys.extend_from_slice(static_keys);
    keys.extend_from_slice(loaded_writable);
    keys.extend_from_slice(loaded_readonly);
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{
        hash::Hash,
        instruction::{AccountMeta, Instruction},
        message::{v0::Message as MessageV0, Message},
        signature::Keypair,
        signer::Signer,
    };

    fn sample_instruction(payer: &Pubkey) -> Instruction {
        Instruction::new_with_bytes(
            Pubkey::new_unique(),
            &[7],
            vec![
                AccountMeta::new(*payer, true),
                AccountMeta::new_readonly(Pubkey::new_unique(), false),
            ],
        )
    }

    #[test]
    fn test_legacy_and_v0_agree() {
        let payer = Keypair::new();
        let ix = sample_instruction(&payer.pubkey());
        let blockhash = Hash::new_unique();

        let legacy = VersionedMessage::Legacy(Message::new_with_blockhash(
            &[ix.clone()],
            Some(&payer.pubkey()),
            &blockhash,
        ));
        let v0 = VersionedMessage::V0(
            MessageV0::try_compile(&payer.pubkey(), &[ix], &[], blockhash).unwrap(),
        );

        assert_eq!(get_static_account_keys(&legacy), get_static_account_keys(&v0));
        assert_eq!(get_required_signers(&legacy), &[payer.pubkey()]);
        assert_eq!(get_required_signers(&v0), &[payer.pubkey()]);
        assert_eq!(get_instructions(&legacy), get_instructions(&v0));
        assert_eq!(get_message_header(&v0).num_required_signatures, 1);
    }

    #[test]
    fn test_resolve_account_keys_order() {
        let payer = Keypair::new();
        let message = VersionedMessage::V0(
            MessageV0::try_compile(
                &payer.pubkey(),
                &[sample_instruction(&payer.pubkey())],
                &[],
                Hash::new_unique(),
            )
            .unwrap(),
        );
        let writable = [Pubkey::new_unique()];
        let readonly = [Pubkey::new_unique(), Pubkey::new_unique()];

        let keys = resolve_account_keys(&message, &writable, &readonly);
        let static_len = get_static_account_keys(&message).len();

        assert_eq!(keys.len(), static_len + 3);
        assert_eq!(keys[static_len], writable[0]);
        assert_eq!(&keys[static_len + 1..], &readonly);
    }
}
