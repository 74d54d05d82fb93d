use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::dom::{Document, ElementId};

/// 按文件名猜测 MIME 类型，生成 `data:` URL
pub fn data_url(file_name: &str, bytes: &[u8]) -> String {
    let mime = mime_guess::from_path(file_name).first_or_octet_stream();
    format!("data:{};base64,{}", mime.essence_str(), STANDARD.encode(bytes))
}

/// `.custom-file-input` 选中文件后：
/// 紧随其后的标签显示文件名，`data-preview` 指向的容器显示预览。
/// 返回预览是否写入
pub fn file_chosen(doc: &mut Document, input: ElementId, file_name: &str, bytes: &[u8]) -> bool {
    if let Some(label) = doc.next_element_sibling(input) {
        doc.set_text(label, file_name);
    }

    let Some(target) = doc.attr(input, "data-preview").map(str::to_string) else {
        return false;
    };
    let container = match doc.query_selector(&target) {
        Ok(Some(container)) => container,
        Ok(None) => return false,
        Err(e) => {
            tracing::warn!("预览容器选择器无效 {}：{}", target, e);
            return false;
        }
    };

    let url = data_url(file_name, bytes);
    if doc.tag(container) == "img" {
        doc.set_attr(container, "src", &url);
    } else {
        doc.set_style(container, "background-image", &format!("url('{url}')"));
    }
    tracing::debug!("文件预览已更新：{}（{} 字节）", file_name, bytes.len());
    true
}
