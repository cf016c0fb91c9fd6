/// Segwit v0 spend: one input, two P2WPKH outputs
pub const SEGWIT_TX: &str = crate::SAMPLE_TX_HEX;
pub const SEGWIT_TXID: &str = "d529cf356e6b31b94a9322ca45b221209290d8f156b1f715c4ed142a6773016f";
pub const SEGWIT_WTXID: &str = "43c4bbcfc72693b060f1a771edfbbf5dcd9f559ad508aeed904c10f9a5bd449d";

/// First bitcoin payment (block 170): one input, two P2PK outputs
pub const LEGACY_TX: &str = "0100000001c997a5e56e104102fa209c6a852dd90660a20b2d9c352423edce25857fcd3704000000004847304402204e45e16932b8af514961a1d3a1a25fdf3f4f7732e9d624c6c61548ab5fb8cd410220181522ec8eca07de4860a4acdd12909d831cc56cbbac4622082221a8768d1d0901ffffffff0200ca9a3b00000000434104ae1a62fe09c5f51b13905f07f06b99a2f7159b2225f374cd378d71302fa28414e7aab37397f554a7df5f142c21c1b7303b8a0626f1baded5c72a704f7e6cd84cac00286bee0000000043410411db93e1dcdb8a016b49840f8c53bc1eb68a382e97b1482ecad7b148a6909a5cb2e0eaddfb84ccf9744464f82e160bfa9b8b64f9d4c03f999b8643f656b412a3ac00000000";
pub const LEGACY_TXID: &str = "f4184fc596403b9d638783cf57adfe4c75c605f6356fbc91338530e9831e9e16";

/// Build a one-input, one-output legacy transaction with the given
/// sequence and scriptPubKey
pub fn legacy_tx_with(sequence: u32, script_pubkey: &[u8]) -> Vec<u8> {
    let mut raw = vec![0x01, 0x00, 0x00, 0x00, 0x01];
    raw.extend_from_slice(&[0x11; 32]);
    raw.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
    raw.push(0x00);
    raw.extend_from_slice(&sequence.to_le_bytes());
    raw.push(0x01);
    raw.extend_from_slice(&50_000u64.to_le_bytes());
    raw.push(script_pubkey.len() as u8);
    raw.extend_from_slice(script_pubkey);
    raw.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
    raw
}
