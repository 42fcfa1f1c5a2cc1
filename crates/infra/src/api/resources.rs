//! Retail resource endpoints
//!
//! Every resource lives at `<base>/<account>/<Resource>[/<id>].json`.
//! Lists go through pagination and degrade to partial results; single-object
//! calls propagate errors.

use lightspeed_domain::{HttpMethod, QueryParams, RequestDescriptor, Result, RetailError};
use serde_json::Value;

use super::client::LightspeedClient;

/// Retail API resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Account,
    Category,
    Customer,
    CustomerType,
    Employee,
    EmployeeHours,
    GiftCard,
    Image,
    Item,
    ItemAttributeSet,
    ItemMatrix,
    Manufacturer,
    Order,
    PaymentType,
    Register,
    Sale,
    SaleLine,
    SpecialOrder,
    TaxClass,
    Vendor,
}

impl Resource {
    pub const ALL: [Resource; 20] = [
        Self::Account,
        Self::Category,
        Self::Customer,
        Self::CustomerType,
        Self::Employee,
        Self::EmployeeHours,
        Self::GiftCard,
        Self::Image,
        Self::Item,
        Self::ItemAttributeSet,
        Self::ItemMatrix,
        Self::Manufacturer,
        Self::Order,
        Self::PaymentType,
        Self::Register,
        Self::Sale,
        Self::SaleLine,
        Self::SpecialOrder,
        Self::TaxClass,
        Self::Vendor,
    ];

    /// Path segment, which is also the envelope data key.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Account => "Account",
            Self::Category => "Category",
            Self::Customer => "Customer",
            Self::CustomerType => "CustomerType",
            Self::Employee => "Employee",
            Self::EmployeeHours => "EmployeeHours",
            Self::GiftCard => "GiftCard",
            Self::Image => "Image",
            Self::Item => "Item",
            Self::ItemAttributeSet => "ItemAttributeSet",
            Self::ItemMatrix => "ItemMatrix",
            Self::Manufacturer => "Manufacturer",
            Self::Order => "Order",
            Self::PaymentType => "PaymentType",
            Self::Register => "Register",
            Self::Sale => "Sale",
            Self::SaleLine => "SaleLine",
            Self::SpecialOrder => "SpecialOrder",
            Self::TaxClass => "TaxClass",
            Self::Vendor => "Vendor",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// CRUD calls for one [`Resource`].
#[derive(Debug, Clone, Copy)]
pub struct ResourceApi<'a> {
    client: &'a LightspeedClient,
    resource: Resource,
}

impl<'a> ResourceApi<'a> {
    pub(crate) fn new(client: &'a LightspeedClient, resource: Resource) -> Self {
        Self { client, resource }
    }

    #[must_use]
    pub fn collection_url(&self) -> String {
        format!("{}/{}.json", self.client.account_url(), self.resource.path())
    }

    /// # Errors
    /// [`RetailError::InvalidInput`] for an empty id.
    pub fn item_url(&self, id: &str) -> Result<String> {
        let id = urlencoding::encode(require_id(self.resource, id)?);
        Ok(format!("{}/{}/{id}.json", self.client.account_url(), self.resource.path()))
    }

    /// Every matching record across all pages.
    pub async fn list(&self, params: QueryParams) -> Vec<Value> {
        let descriptor = RequestDescriptor::get(self.collection_url()).with_params(params);
        self.client.get_all_data(descriptor).await
    }

    /// One record, unwrapped from its envelope.
    ///
    /// # Errors
    /// [`RetailError::InvalidInput`] for an empty id, otherwise request errors.
    pub async fn get(&self, id: &str, params: QueryParams) -> Result<Value> {
        let descriptor = RequestDescriptor::get(self.item_url(id)?).with_params(params);
        Ok(self.client.execute(&descriptor).await?.into_data())
    }

    /// # Errors
    /// Request errors.
    pub async fn create(&self, data: Value) -> Result<Value> {
        require_data(&data)?;
        let descriptor = RequestDescriptor::post(self.collection_url(), data);
        Ok(self.client.execute(&descriptor).await?.payload)
    }

    /// # Errors
    /// [`RetailError::InvalidInput`] for an empty id, otherwise request errors.
    pub async fn update(&self, id: &str, data: Value) -> Result<Value> {
        require_data(&data)?;
        let descriptor = RequestDescriptor::put(self.item_url(id)?, data);
        Ok(self.client.execute(&descriptor).await?.payload)
    }

    /// # Errors
    /// [`RetailError::InvalidInput`] for an empty id, otherwise request errors.
    pub async fn delete(&self, id: &str) -> Result<Value> {
        let descriptor = RequestDescriptor::new(HttpMethod::Delete, self.item_url(id)?);
        Ok(self.client.execute(&descriptor).await?.payload)
    }
}

fn require_id(resource: Resource, id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(RetailError::InvalidInput(format!("a {resource} id is required")));
    }
    Ok(id)
}

fn require_data(data: &Value) -> Result<()> {
    match data {
        Value::Null => Err(RetailError::InvalidInput("request data is required".into())),
        _ => Ok(()),
    }
}

/// Named queries on top of [`ResourceApi`].
impl LightspeedClient {
    /// The account record for the configured account id.
    ///
    /// # Errors
    /// Request errors.
    pub async fn get_account(&self) -> Result<Value> {
        let descriptor = RequestDescriptor::get(format!("{}.json", self.account_url()));
        Ok(self.execute(&descriptor).await?.into_data())
    }

    /// Items whose `itemID` is in `ids`.
    ///
    /// # Errors
    /// [`RetailError::InvalidInput`] when `ids` is empty.
    pub async fn get_items_by_ids<S: AsRef<str>>(
        &self,
        ids: &[S],
        params: QueryParams,
    ) -> Result<Vec<Value>> {
        if ids.is_empty() {
            return Err(RetailError::InvalidInput("at least one itemID is required".into()));
        }
        let joined = ids.iter().map(|id| id.as_ref().trim()).collect::<Vec<&str>>().join(",");
        Ok(self.resource(Resource::Item).list(params.with("itemID", format!("IN,[{joined}]"))).await)
    }

    /// # Errors
    /// [`RetailError::InvalidInput`] for an empty category id.
    pub async fn get_items_by_category(
        &self,
        category_id: &str,
        params: QueryParams,
    ) -> Result<Vec<Value>> {
        let id = require_id(Resource::Category, category_id)?;
        Ok(self.resource(Resource::Item).list(params.with("categoryID", id)).await)
    }

    /// Items with quantity on hand below `threshold`.
    pub async fn get_items_with_low_stock(&self, threshold: i64, params: QueryParams) -> Vec<Value> {
        self.resource(Resource::Item).list(params.with("qoh", format!("<,{threshold}"))).await
    }

    /// Items whose default vendor is `vendor_id`.
    ///
    /// # Errors
    /// [`RetailError::InvalidInput`] for an empty vendor id.
    pub async fn get_vendor_items(&self, vendor_id: &str, params: QueryParams) -> Result<Vec<Value>> {
        let id = require_id(Resource::Vendor, vendor_id)?;
        Ok(self.resource(Resource::Item).list(params.with("defaultVendorID", id)).await)
    }

    /// Customers whose contact email matches `email`, contacts loaded.
    ///
    /// # Errors
    /// [`RetailError::InvalidInput`] for an empty email.
    pub async fn search_customers_by_email(&self, email: &str) -> Result<Vec<Value>> {
        let email = email.trim();
        if email.is_empty() {
            return Err(RetailError::InvalidInput("an email address is required".into()));
        }
        let params =
            QueryParams::new().load_relations(["Contact"]).with("Contact.email", format!("~,{email}"));
        Ok(self.resource(Resource::Customer).list(params).await)
    }

    /// Sales with `timeStamp` between `start` and `end`, sorted by
    /// `timeStamp` unless `params` sorts otherwise.
    ///
    /// # Errors
    /// [`RetailError::InvalidInput`] when either bound is empty.
    pub async fn get_sales_by_date_range(
        &self,
        start: &str,
        end: &str,
        mut params: QueryParams,
    ) -> Result<Vec<Value>> {
        if start.trim().is_empty() || end.trim().is_empty() {
            return Err(RetailError::InvalidInput(
                "both start and end dates are required".into(),
            ));
        }
        if params.get("sort").is_none() {
            params.insert("sort", "timeStamp");
        }
        let params =
            params.raw(&format!("timeStamp={}{start},{end}", urlencoding::encode("><,")));
        Ok(self.resource(Resource::Sale).list(params).await)
    }

    /// Open purchase orders for a vendor.
    ///
    /// # Errors
    /// [`RetailError::InvalidInput`] for an empty vendor id.
    pub async fn get_open_orders_by_vendor(
        &self,
        vendor_id: &str,
        params: QueryParams,
    ) -> Result<Vec<Value>> {
        let id = require_id(Resource::Vendor, vendor_id)?;
        let params = params.with("vendorID", id).with("complete", "false");
        Ok(self.resource(Resource::Order).list(params).await)
    }

    /// # Errors
    /// [`RetailError::InvalidInput`] for an empty item id.
    pub async fn get_sale_lines_by_item(
        &self,
        item_id: &str,
        params: QueryParams,
    ) -> Result<Vec<Value>> {
        let id = require_id(Resource::Item, item_id)?;
        Ok(self.resource(Resource::SaleLine).list(params.with("itemID", id)).await)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use lightspeed_domain::{ClientConfig, Credentials};

    use super::*;

    fn client() -> LightspeedClient {
        LightspeedClient::builder(Credentials::new("id", "secret", "555"))
            .config(ClientConfig { base_url: "http://127.0.0.1:9/API".into(), ..ClientConfig::default() })
            .build()
            .unwrap()
    }

    #[test]
    fn paths_are_unique() {
        let paths: HashSet<_> = Resource::ALL.iter().map(|r| r.path()).collect();
        assert_eq!(paths.len(), Resource::ALL.len());
        assert_eq!(Resource::ItemMatrix.to_string(), "ItemMatrix");
    }

    #[test]
    fn urls_follow_account_layout() {
        let client = client();
        let items = client.resource(Resource::Item);
        assert_eq!(items.collection_url(), "http://127.0.0.1:9/API/555/Item.json");
        assert_eq!(items.item_url(" 42 ").unwrap(), "http://127.0.0.1:9/API/555/Item/42.json");
    }

    #[test]
    fn item_ids_are_percent_encoded() {
        let client = client();
        let items = client.resource(Resource::Item);
        assert_eq!(
            items.item_url("a/b?c").unwrap(),
            "http://127.0.0.1:9/API/555/Item/a%2Fb%3Fc.json"
        );
        assert_eq!(items.item_url("x y#1").unwrap(), "http://127.0.0.1:9/API/555/Item/x%20y%231.json");
    }

    #[tokio::test]
    async fn missing_ids_are_rejected_before_any_request() {
        let client = client();
        let vendors = client.resource(Resource::Vendor);

        assert!(matches!(vendors.get("", QueryParams::new()).await, Err(RetailError::InvalidInput(_))));
        assert!(matches!(
            vendors.update("  ", serde_json::json!({"name": "x"})).await,
            Err(RetailError::InvalidInput(_))
        ));
        assert!(matches!(vendors.create(Value::Null).await, Err(RetailError::InvalidInput(_))));
        assert!(matches!(
            client.get_items_by_ids::<&str>(&[], QueryParams::new()).await,
            Err(RetailError::InvalidInput(_))
        ));
        assert!(matches!(
            client.get_sales_by_date_range("2024-01-01", "", QueryParams::new()).await,
            Err(RetailError::InvalidInput(_))
        ));
        assert!(matches!(
            client.search_customers_by_email(" ").await,
            Err(RetailError::InvalidInput(_))
        ));
    }
}
